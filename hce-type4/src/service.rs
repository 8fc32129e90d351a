//! Host card emulation service
//!
//! The entry point the platform calls for every command APDU. It holds the
//! state machine of the current emulation session and forwards commands to
//! it, answering 6985 while no tag is installed.

use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::apdu::{Response, StatusWord};
use crate::field::hexify;
use crate::type4::HceStateMachine;

/// Slot holding the tag of the current emulation session
#[derive(Default)]
pub struct HceService {
    machine: Mutex<Option<Arc<HceStateMachine>>>,
}

impl HceService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a tag, returning the one it replaces
    pub fn install(&self, machine: Arc<HceStateMachine>) -> Option<Arc<HceStateMachine>> {
        info!("Installing tag with AID {}", hexify(&machine.aid()));
        self.machine.lock().replace(machine)
    }

    /// Remove the installed tag
    pub fn clear(&self) -> Option<Arc<HceStateMachine>> {
        let previous = self.machine.lock().take();
        if previous.is_some() {
            info!("Tag removed");
        }
        previous
    }

    pub fn is_installed(&self) -> bool {
        self.machine.lock().is_some()
    }

    /// Handle to the installed tag
    pub fn current(&self) -> Option<Arc<HceStateMachine>> {
        self.machine.lock().clone()
    }

    /// Process a command APDU from the reader
    pub fn process_command_apdu(&self, apdu: &[u8]) -> Vec<u8> {
        // Don't hold the slot while the tag works
        match self.current() {
            Some(machine) => machine.process_command(apdu),
            None => {
                warn!("APDU {} received with no tag installed", hexify(apdu));
                Response::error(StatusWord::CONDITIONS_NOT_SATISFIED).to_bytes()
            }
        }
    }

    /// The reader left the field
    pub fn on_deactivated(&self) {
        match self.current() {
            Some(machine) => machine.on_deactivated(),
            None => debug!("Deactivated with no tag installed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::HceConfig;
    use crate::ndef::{rtd, NdefMessage};
    use crate::type4::{SessionState, NDEF_FILE_ID, NDEF_TAG_APPLICATION_AID};
    use std::thread;

    fn installed() -> (HceService, Arc<HceStateMachine>) {
        let service = HceService::new();
        let machine = Arc::new(HceStateMachine::from_config(&HceConfig::default()).unwrap());
        assert!(service.install(Arc::clone(&machine)).is_none());
        (service, machine)
    }

    #[test]
    fn test_no_tag_installed() {
        let service = HceService::new();
        assert!(!service.is_installed());
        assert_eq!(
            service.process_command_apdu(&hex::decode("00A4040007D2760000850101").unwrap()),
            vec![0x69, 0x85]
        );
        service.on_deactivated();
        assert!(service.clear().is_none());
    }

    #[test]
    fn test_forwarding() {
        let (service, machine) = installed();
        assert!(service.is_installed());

        let response = service.process_command_apdu(&hex::decode("00A4040007D2760000850101").unwrap());
        assert_eq!(response, vec![0x90, 0x00]);
        let response = service.process_command_apdu(&hex::decode("00A4000C02E103").unwrap());
        assert_eq!(response, vec![0x90, 0x00]);
        let response = service.process_command_apdu(&hex::decode("00B000000F").unwrap());
        assert_eq!(
            response,
            hex::decode("000F2000FF00FF0406E104080000FF9000").unwrap()
        );
        assert_eq!(machine.session_state(), SessionState::FileSelected(0xE103));

        service.on_deactivated();
        assert_eq!(machine.session_state(), SessionState::Idle);
        assert_eq!(
            service.process_command_apdu(&hex::decode("00B000000F").unwrap()),
            vec![0x69, 0x85]
        );
    }

    #[test]
    fn test_install_replaces_and_clear() {
        let (service, first) = installed();
        let second = Arc::new(
            HceStateMachine::with_ndef_message(
                &[0xF0, 0x01, 0x02, 0x03, 0x04],
                &NdefMessage::single(rtd::uri("https://example.com").unwrap()),
                false,
            )
            .unwrap(),
        );

        let previous = service.install(Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));

        // the NDEF AID is gone with the first tag
        assert_eq!(
            service.process_command_apdu(&hex::decode("00A4040007D2760000850101").unwrap()),
            vec![0x6A, 0x82]
        );
        assert_eq!(
            service.process_command_apdu(&hex::decode("00A4040005F001020304").unwrap()),
            vec![0x90, 0x00]
        );

        let removed = service.clear().unwrap();
        assert!(Arc::ptr_eq(&removed, &second));
        assert!(!service.is_installed());
        assert!(service.current().is_none());
    }

    #[test]
    fn test_configuration_from_another_thread() {
        let (service, machine) = installed();
        let service = Arc::new(service);
        let message = NdefMessage::single(rtd::text("en", "updated").unwrap());

        let writer = {
            let machine = Arc::clone(&machine);
            let message = message.clone();
            thread::spawn(move || {
                for i in 0..100u16 {
                    machine
                        .add_or_replace_file(0xE105, &message, 128, i % 2 == 1)
                        .unwrap();
                    machine
                        .add_or_replace_file(NDEF_FILE_ID, &message, 128, false)
                        .unwrap();
                }
            })
        };

        for _ in 0..100 {
            assert_eq!(
                service.process_command_apdu(&hex::decode("00A4040007D2760000850101").unwrap()),
                vec![0x90, 0x00]
            );
            assert_eq!(
                service.process_command_apdu(&hex::decode("00A4000C02E104").unwrap()),
                vec![0x90, 0x00]
            );
            let response = service.process_command_apdu(&hex::decode("00B0000002").unwrap());
            assert_eq!(response.len(), 4);
            assert_eq!(&response[2..], &[0x90, 0x00]);
        }

        writer.join().unwrap();
        assert_eq!(machine.file_ids(), vec![NDEF_FILE_ID, 0xE105]);
        assert_eq!(machine.ndef_message(NDEF_FILE_ID).unwrap(), Some(message));
        assert_eq!(machine.aid(), NDEF_TAG_APPLICATION_AID);
    }
}
