use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type used at the host module-loading seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a [`Registry::load`](crate::Registry::load) failed.
///
/// Host and plugin errors are passed through with their message intact.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Resolve(io::Error),

    #[error("{0}")]
    Open(BoxError),

    #[error("{0}")]
    Lookup(BoxError),

    /// The entry symbol exists but is not a declaration for this ABI.
    #[error("Incompatible plugin initializer")]
    Incompatible,

    /// The initializer panicked. The payload is dropped.
    #[error("Plugin initializer panicked")]
    Faulted,

    /// The initializer returned an error.
    #[error(transparent)]
    Init(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("read_dir {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_messages_are_verbatim() {
        assert_eq!(
            LoadError::Resolve(io::Error::other("disk error")).to_string(),
            "disk error"
        );
        assert_eq!(LoadError::Open("no such file".into()).to_string(), "no such file");
        assert_eq!(LoadError::Lookup("missing".into()).to_string(), "missing");
        assert_eq!(
            LoadError::Init(anyhow::anyhow!("bad config")).to_string(),
            "bad config"
        );
    }

    #[test]
    fn fixed_messages() {
        assert_eq!(
            LoadError::Incompatible.to_string(),
            "Incompatible plugin initializer"
        );
        assert_eq!(LoadError::Faulted.to_string(), "Plugin initializer panicked");
    }
}
