//! Configuration access port.

use crate::domain::error::RegimeTraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent; `ConfigInvalid` when present but not
    /// a recognised boolean.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, RegimeTraderError>;
}
