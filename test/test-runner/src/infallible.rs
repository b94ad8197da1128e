use std::error::Error;
use std::fmt;

/// The error of a phase that cannot fail.
#[derive(Debug)]
pub enum NoError {}

impl Error for NoError {}

impl fmt::Display for NoError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
