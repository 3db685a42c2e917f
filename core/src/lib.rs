pub mod estimator;
pub mod models;
pub mod openfoodfacts;
pub mod reconcile;
pub mod usda;
