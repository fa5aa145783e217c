use std::fmt;

use serde::{Deserialize, Serialize};

/// A block height, counting up from the genesis block at height 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Height(pub i64);

impl Height {
    pub fn value(self) -> i64 {
        self.0
    }

    /// The height immediately preceding this one, or `None` at genesis.
    pub fn previous(self) -> Option<Height> {
        if self.0 == 0 {
            None
        } else {
            Some(Height(self.0 - 1))
        }
    }

    pub fn next(self) -> Height {
        Height(self.0 + 1)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
