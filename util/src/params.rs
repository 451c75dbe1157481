//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ARM_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$ARM_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    // Get the params dir
    let mut path = crate::host::get_arm_sw_root().map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e)),
    };

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

/// Load a parameter file, falling back to the default parameters if the file cannot be found.
///
/// A file which exists but cannot be parsed is still an error, silently running with the
/// defaults would hide a broken parameter file.
pub fn load_or_default<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned + Default,
{
    match load(param_file_path) {
        Ok(p) => Ok(p),
        Err(LoadError::SwRootNotSet) | Err(LoadError::FileLoadError(_)) => {
            warn!(
                "Parameter file {} not available, using default parameters",
                param_file_path
            );
            Ok(P::default())
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct TestParams {
        cooldown_s: f64,
        angles: Vec<i32>,
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str("cooldown_s = 0.2\nangles = [1, 2, 3]").unwrap();
        assert_eq!(
            p,
            TestParams {
                cooldown_s: 0.2,
                angles: vec![1, 2, 3]
            }
        );

        let bad: Result<TestParams, _> = from_str("cooldown_s = \"slow\"");
        assert!(matches!(bad, Err(LoadError::DeserialiseError(_))));
    }
}
