pub use super::esp_keys::Entity as EspKeys;
pub use super::users::Entity as Users;
