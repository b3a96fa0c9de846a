pub use super::lock::Entity as Lock;
