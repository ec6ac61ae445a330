pub mod ingredients;
pub mod media;
pub mod recipe_lists;
pub mod recipes;
pub mod representation;
pub mod shopping_list;
pub mod subscriptions;
