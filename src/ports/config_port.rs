//! Configuration access port trait.

/// Typed lookups over a sectioned key/value source.
///
/// `Ok(None)` means the key is absent. `Err` carries the reason a present
/// value could not be read as the requested type.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;
}
