use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What survives between two `tally` invocations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocalState {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl LocalState {
    pub fn load(path: &str) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let parent = Path::new(path).parent();
        if let Some(parent) = parent
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn sign_in(&mut self, token: &str, email: &str) {
        self.token = Some(token.to_string());
        self.email = Some(email.to_string());
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}
