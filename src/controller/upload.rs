//! Upload form state machine.
//!
//! `Idle -> Validating -> {Rejected | Uploading} -> {Succeeded | Failed} -> Idle`.
//! Validation happens inside [`UploadController::submit`]; a rejected form
//! never leaves `Idle`.

use std::path::PathBuf;

use crate::domain::{DatasetFiles, UploadRole};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Uploading,
}

#[derive(Debug)]
pub struct UploadController {
    slots: [Option<PathBuf>; 3],
    phase: UploadPhase,
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadController {
    pub fn new() -> Self {
        Self {
            slots: [None, None, None],
            phase: UploadPhase::Idle,
        }
    }

    /// Bind (or unbind with `None`) the file for one role. Blank paths count as unbound.
    pub fn bind(&mut self, role: UploadRole, path: Option<PathBuf>) {
        self.slots[role.index()] = path.filter(|p| !p.as_os_str().is_empty());
    }

    pub fn slot(&self, role: UploadRole) -> Option<&PathBuf> {
        self.slots[role.index()].as_ref()
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn submit_enabled(&self) -> bool {
        self.phase == UploadPhase::Idle
    }

    pub fn spinner_visible(&self) -> bool {
        self.phase == UploadPhase::Uploading
    }

    /// Form-submitted event.
    ///
    /// - `Ok(None)`: an upload is already running, submission ignored
    /// - `Err(_)`: at least one role has no file; no upload starts
    /// - `Ok(Some(files))`: validated, now `Uploading`
    pub fn submit(&mut self) -> Result<Option<DatasetFiles>, ValidationError> {
        if !self.submit_enabled() {
            return Ok(None);
        }

        let (materials, prices, vendors) = match &self.slots {
            [Some(m), Some(p), Some(v)] => (m.clone(), p.clone(), v.clone()),
            _ => {
                let missing = UploadRole::ALL
                    .into_iter()
                    .filter(|r| self.slot(*r).is_none())
                    .map(|r| r.field_name())
                    .collect();
                return Err(ValidationError::MissingUploadFiles(missing));
            }
        };

        self.phase = UploadPhase::Uploading;
        Ok(Some(DatasetFiles {
            materials,
            prices,
            vendors,
        }))
    }

    /// Upload finished. The form is reset only on success.
    pub fn finish(&mut self, succeeded: bool) {
        self.phase = UploadPhase::Idle;
        if succeeded {
            self.slots = [None, None, None];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_files_is_rejected() {
        let mut u = UploadController::new();
        u.bind(UploadRole::Materials, Some("m.csv".into()));
        u.bind(UploadRole::Vendors, Some("v.csv".into()));

        assert_eq!(
            u.submit(),
            Err(ValidationError::MissingUploadFiles(vec!["prices"]))
        );
        assert_eq!(u.phase(), UploadPhase::Idle);
        assert!(u.submit_enabled());
    }

    #[test]
    fn empty_form_lists_every_role_and_stays_idle() {
        let mut u = UploadController::new();
        assert_eq!(
            u.submit(),
            Err(ValidationError::MissingUploadFiles(vec!["materials", "prices", "vendors"]))
        );
        assert_eq!(u.phase(), UploadPhase::Idle);
        assert!(u.submit_enabled());
    }

    #[test]
    fn blank_path_counts_as_missing() {
        let mut u = UploadController::new();
        for role in UploadRole::ALL {
            u.bind(role, Some("x.csv".into()));
        }
        u.bind(UploadRole::Prices, Some(PathBuf::new()));
        assert!(u.submit().is_err());
    }

    #[test]
    fn upload_disables_submit_until_finished() {
        let mut u = UploadController::new();
        u.bind(UploadRole::Materials, Some("m.csv".into()));
        u.bind(UploadRole::Prices, Some("p.csv".into()));
        u.bind(UploadRole::Vendors, Some("v.csv".into()));

        let files = u.submit().unwrap().unwrap();
        assert_eq!(files.prices, PathBuf::from("p.csv"));
        assert!(u.spinner_visible());
        assert!(!u.submit_enabled());
        assert_eq!(u.submit(), Ok(None));

        u.finish(false);
        assert!(u.submit_enabled());
        assert!(u.slot(UploadRole::Materials).is_some());

        u.submit().unwrap().unwrap();
        u.finish(true);
        assert!(UploadRole::ALL.iter().all(|r| u.slot(*r).is_none()));
    }
}
