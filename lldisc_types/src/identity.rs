//! Machine-identity resolution (spec §6 "Machine identity").

use std::fs;

use crate::error::TypesError;
use crate::model::MachineId;

const LINUX_MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Returns a stable per-host identifier: on Linux, the trimmed contents of
/// `/etc/machine-id`. This is the only way the packet codec's encoder can
/// fail (spec §4.1): if the host cannot supply its own machine id.
pub fn local_machine_id() -> Result<MachineId, TypesError> {
    match fs::read_to_string(LINUX_MACHINE_ID_PATH) {
        Ok(contents) => {
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                Err(TypesError::NoMachineId(format!(
                    "{LINUX_MACHINE_ID_PATH} was empty"
                )))
            } else {
                Ok(MachineId(trimmed.to_string()))
            }
        }
        Err(e) => Err(TypesError::NoMachineId(format!(
            "could not read {LINUX_MACHINE_ID_PATH}: {e}"
        ))),
    }
}
