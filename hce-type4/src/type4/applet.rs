//! NDEF Tag Application
//!
//! Routes command APDUs against the session state and the file table and
//! answers with ISO 7816-4 status words.
//!
//! Two locks guard the tag, one for the session and one for the file table.
//! They are never held together: a command consults the file table before
//! its session transition and copies or writes file bytes after it.
//! Configuration calls take only the file lock.

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::files::{decode_ndef_file, FileSystem};
use super::session::{Session, SessionState};
use super::{DEFAULT_MAX_FILE_SIZE, NDEF_FILE_ID};
use crate::apdu::{Command, Params, Response, SelectMode, StatusWord, CLA_STANDARD};
use crate::card::config::HceConfig;
use crate::error::HceError;
use crate::field::hexify;
use crate::ndef::NdefMessage;

const MIN_AID_LEN: usize = 5;
const MAX_AID_LEN: usize = 16;

/// Emulated NFC Forum Type 4 Tag
pub struct HceStateMachine {
    aid: Vec<u8>,
    session: Mutex<Session>,
    files: Mutex<FileSystem>,
}

impl HceStateMachine {
    /// Create a tag answering to `aid` with an empty file table
    pub fn new(aid: &[u8]) -> Result<Self, HceError> {
        if !(MIN_AID_LEN..=MAX_AID_LEN).contains(&aid.len()) {
            return Err(HceError::InvalidAid(format!(
                "AID must be {} to {} bytes, got {}",
                MIN_AID_LEN,
                MAX_AID_LEN,
                aid.len()
            )));
        }
        // RID must not start with 00 or FF
        if matches!(aid[0], 0x00 | 0xFF) {
            return Err(HceError::InvalidAid(format!(
                "RID may not start with {:02X}",
                aid[0]
            )));
        }
        Ok(Self {
            aid: aid.to_vec(),
            session: Mutex::new(Session::new()),
            files: Mutex::new(FileSystem::new()),
        })
    }

    /// Create a tag holding `message` in NDEF file E104
    pub fn with_ndef_message(
        aid: &[u8],
        message: &NdefMessage,
        writable: bool,
    ) -> Result<Self, HceError> {
        let machine = Self::new(aid)?;
        machine.add_or_replace_file(NDEF_FILE_ID, message, DEFAULT_MAX_FILE_SIZE, writable)?;
        Ok(machine)
    }

    /// Create a tag from a configuration
    pub fn from_config(config: &HceConfig) -> Result<Self, HceError> {
        let machine = Self::new(&config.aid)?;
        let message = config.message()?;
        machine.add_or_replace_file(
            config.file_id,
            &message,
            config.max_file_size,
            config.writable,
        )?;
        info!(
            "Type 4 Tag ready: AID {}, {} record(s) in file {:04X}",
            hexify(&config.aid),
            message.len(),
            config.file_id
        );
        Ok(machine)
    }

    pub fn aid(&self) -> Vec<u8> {
        self.aid.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.lock().state()
    }

    /// Install or replace a file holding `message`
    pub fn add_or_replace_file(
        &self,
        file_id: u16,
        message: &NdefMessage,
        max_file_size: u16,
        writable: bool,
    ) -> Result<(), HceError> {
        self.files
            .lock()
            .add_or_replace(file_id, message, max_file_size, writable)
    }

    pub fn delete_file(&self, file_id: u16) -> Result<(), HceError> {
        self.files.lock().delete(file_id)
    }

    pub fn clear_all_files(&self) {
        self.files.lock().clear();
    }

    pub fn has_file(&self, file_id: u16) -> bool {
        self.files.lock().contains(file_id)
    }

    /// Data file ids in table order
    pub fn file_ids(&self) -> Vec<u16> {
        self.files.lock().file_ids()
    }

    /// Copy of a file's current content, the CC included
    pub fn file_bytes(&self, file_id: u16) -> Option<Vec<u8>> {
        self.files.lock().read(file_id)
    }

    pub fn capability_container_bytes(&self) -> Option<Vec<u8>> {
        self.files
            .lock()
            .capability_container()
            .map(|cc| cc.to_bytes())
    }

    /// Current NDEF message of a file, `None` while NLEN is zero
    ///
    /// Reflects whatever a reader has written with UPDATE BINARY.
    pub fn ndef_message(&self, file_id: u16) -> Result<Option<NdefMessage>, HceError> {
        let data = self
            .files
            .lock()
            .read(file_id)
            .ok_or(HceError::FileNotFound(file_id))?;
        decode_ndef_file(&data)
    }

    /// The reader left the field
    pub fn on_deactivated(&self) {
        self.session.lock().reset();
        info!("Reader deactivated, session reset");
    }

    /// Process one command APDU and return the response APDU
    ///
    /// The result always ends with a status word.
    pub fn process_command(&self, raw: &[u8]) -> Vec<u8> {
        debug!("C-APDU: {}", hexify(raw));

        let response = match Command::parse(raw) {
            Ok(_) if raw[0] != CLA_STANDARD => {
                debug!("Unsupported CLA {:02X}", raw[0]);
                Response::error(StatusWord::CLA_NOT_SUPPORTED)
            }
            Ok(command) => {
                let selectable = self.selectable_target(&command);
                let step = {
                    let mut session = self.session.lock();
                    self.dispatch(&mut session, &command, selectable)
                };
                match step {
                    Ok(Step::Respond(response)) => response,
                    Ok(Step::Read {
                        file_id,
                        offset,
                        le,
                    }) => self
                        .handle_read_binary(file_id, offset, le)
                        .unwrap_or_else(|e| error_response(&e)),
                    Ok(Step::Update {
                        file_id,
                        offset,
                        data,
                    }) => self.handle_update_binary(file_id, offset, data),
                    Err(e) => error_response(&e),
                }
            }
            Err(e) => error_response(&HceError::from(e)),
        };

        let bytes = response.to_bytes();
        debug!("R-APDU: {}", hexify(&bytes));
        bytes
    }

    /// Whether the file named by a SELECT by file id exists right now
    fn selectable_target(&self, command: &Command) -> bool {
        match command {
            Command::Select { params, data }
                if params.select_mode() == Some(SelectMode::ByFileId) && data.len() == 2 =>
            {
                self.files
                    .lock()
                    .is_selectable(u16::from_be_bytes([data[0], data[1]]))
            }
            _ => false,
        }
    }

    fn dispatch<'a>(
        &self,
        session: &mut Session,
        command: &'a Command,
        selectable: bool,
    ) -> Result<Step<'a>, HceError> {
        debug!(
            "{} P1-P2={:04X} in state {:?}",
            command.name(),
            command.params().value(),
            session.state()
        );

        match command {
            Command::Select { params, data } => {
                self.handle_select(session, *params, data, selectable).map(Step::Respond)
            }
            Command::ReadBinary { params, le } => match session.state() {
                SessionState::FileSelected(file_id) => Ok(Step::Read {
                    file_id,
                    offset: params.offset(),
                    le: *le,
                }),
                state => Ok(Step::Respond(not_serving(state))),
            },
            Command::UpdateBinary { params, data } => match session.state() {
                SessionState::FileSelected(file_id) => Ok(Step::Update {
                    file_id,
                    offset: params.offset(),
                    data: data.as_slice(),
                }),
                state => Ok(Step::Respond(not_serving(state))),
            },
            Command::Unknown { ins, .. } => {
                debug!("Unsupported INS {:02X}", ins);
                Ok(Step::Respond(Response::error(StatusWord::INS_NOT_SUPPORTED)))
            }
        }
    }

    fn handle_select(
        &self,
        session: &mut Session,
        params: Params,
        data: &[u8],
        selectable: bool,
    ) -> Result<Response, HceError> {
        // Any SELECT leaves the current file first
        session.deselect_file();

        match params.select_mode() {
            Some(SelectMode::ByName) => Ok(self.select_application(session, data)),
            Some(SelectMode::ByFileId) => Ok(self.select_file(session, data, selectable)),
            None => Ok(Response::error(StatusWord::WRONG_P1_P2)),
        }
    }

    fn select_application(&self, session: &mut Session, aid: &[u8]) -> Response {
        if aid != self.aid.as_slice() {
            debug!("Unknown AID: {}", hexify(aid));
            return Response::error(StatusWord::FILE_NOT_FOUND);
        }
        session.select_application();
        info!("NDEF Tag Application selected");
        Response::ok()
    }

    fn select_file(&self, session: &mut Session, data: &[u8], selectable: bool) -> Response {
        if session.state() == SessionState::Idle {
            return Response::error(StatusWord::CONDITIONS_NOT_SATISFIED);
        }
        if data.len() != 2 {
            return Response::error(StatusWord::WRONG_LENGTH);
        }

        let file_id = u16::from_be_bytes([data[0], data[1]]);
        if !selectable {
            debug!("SELECT of unknown file {:04X}", file_id);
            return Response::error(StatusWord::FILE_NOT_FOUND);
        }
        session.select_file(file_id);
        debug!("Selected file {:04X}", file_id);
        Response::ok()
    }

    fn handle_read_binary(&self, file_id: u16, offset: u16, le: u8) -> Result<Response, HceError> {
        let buffer = self
            .files
            .lock()
            .read(file_id)
            .ok_or(HceError::FileNotFound(file_id))?;

        let offset = offset as usize;
        if offset > buffer.len() {
            return Ok(Response::error(StatusWord::WRONG_OFFSET));
        }
        let requested = if le == 0 { 256 } else { le as usize };
        let end = offset + requested.min(buffer.len() - offset);
        Ok(Response::success(buffer[offset..end].to_vec()))
    }

    fn handle_update_binary(&self, file_id: u16, offset: u16, data: &[u8]) -> Response {
        match self.files.lock().write(file_id, offset, data) {
            Ok(()) => Response::ok(),
            Err(e) => {
                debug!("UPDATE BINARY on {:04X} refused: {:?}", file_id, e);
                Response::error(e.status_word())
            }
        }
    }
}

/// Outcome of the session stage of a command
enum Step<'a> {
    Respond(Response),
    Read { file_id: u16, offset: u16, le: u8 },
    Update { file_id: u16, offset: u16, data: &'a [u8] },
}

/// READ or UPDATE BINARY without a selected file
fn not_serving(state: SessionState) -> Response {
    match state {
        SessionState::Idle => Response::error(StatusWord::CONDITIONS_NOT_SATISFIED),
        _ => Response::error(StatusWord::INS_NOT_SUPPORTED),
    }
}

fn error_response(err: &HceError) -> Response {
    warn!("Command failed ({}): {}", err.code(), err);
    Response::error(err.status_word())
}
