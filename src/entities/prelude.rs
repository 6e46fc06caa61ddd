pub use super::photos::Entity as Photos;
