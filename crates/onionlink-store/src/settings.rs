//! User settings, persisted through the encrypted store
//!
//! The on-disk record is the concatenation of every field in [`FIELDS`]
//! order: booleans as 1 byte, integers as 8 bytes big-endian, floats as
//! 8-byte IEEE-754. Adding a field means appending a descriptor; reordering
//! breaks existing databases.

use std::fmt;
use std::path::{Path, PathBuf};

use onionlink_core::consts::{
    ENCODED_BOOLEAN_LENGTH, ENCODED_FLOAT_LENGTH, ENCODED_INTEGER_LENGTH,
    NEW_MESSAGE_NOTIFY_MIN_DURATION, TRAFFIC_MASKING_MIN_RANDOM_DELAY,
    TRAFFIC_MASKING_MIN_STATIC_DELAY,
};
use onionlink_core::{Error, FatalKind, RecoverableKind, Result};
use onionlink_crypto::SymmetricKey;
use onionlink_encoding::{
    bool_to_bytes, bytes_to_bool, bytes_to_double, bytes_to_int, double_to_bytes, int_to_bytes,
};

use crate::blob::BlobStore;
use crate::medium::{DiskMedium, Medium};
use crate::sealer::AeadSealer;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub disable_gui_dialog: bool,
    pub max_number_of_group_members: u64,
    pub max_number_of_groups: u64,
    pub max_number_of_contacts: u64,
    pub log_messages_by_default: bool,
    pub accept_files_by_default: bool,
    pub show_notifications_by_default: bool,
    pub log_file_masking: bool,
    pub ask_password_for_log_access: bool,
    pub nc_bypass_messages: bool,
    pub confirm_sent_files: bool,
    pub double_space_exits: bool,
    pub traffic_masking: bool,
    pub tm_static_delay: f64,
    pub tm_random_delay: f64,
    pub allow_contact_requests: bool,
    pub new_message_notify_preview: bool,
    pub new_message_notify_duration: f64,
    pub max_decompress_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disable_gui_dialog: false,
            max_number_of_group_members: 50,
            max_number_of_groups: 50,
            max_number_of_contacts: 50,
            log_messages_by_default: false,
            accept_files_by_default: false,
            show_notifications_by_default: true,
            log_file_masking: false,
            ask_password_for_log_access: true,
            nc_bypass_messages: false,
            confirm_sent_files: true,
            double_space_exits: false,
            traffic_masking: false,
            tm_static_delay: 2.0,
            tm_random_delay: 2.0,
            allow_contact_requests: true,
            new_message_notify_preview: false,
            new_message_notify_duration: 1.0,
            max_decompress_size: 100_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Float,
}

impl Kind {
    fn width(self) -> usize {
        match self {
            Kind::Bool => ENCODED_BOOLEAN_LENGTH,
            Kind::Int => ENCODED_INTEGER_LENGTH,
            Kind::Float => ENCODED_FLOAT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(u64),
    Float(f64),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{v}"),
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::Float(v) => write!(f, "{v}"),
        }
    }
}

fn type_mismatch(expected: &str, got: SettingValue) -> Error {
    Error::fatal(
        FatalKind::InvalidParameter,
        format!("setting type mismatch: expected {expected}, got {got:?}"),
    )
}

impl TryFrom<SettingValue> for bool {
    type Error = Error;
    fn try_from(value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::Bool(v) => Ok(v),
            other => Err(type_mismatch("bool", other)),
        }
    }
}

impl TryFrom<SettingValue> for u64 {
    type Error = Error;
    fn try_from(value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::Int(v) => Ok(v),
            other => Err(type_mismatch("int", other)),
        }
    }
}

impl TryFrom<SettingValue> for f64 {
    type Error = Error;
    fn try_from(value: SettingValue) -> Result<Self> {
        match value {
            SettingValue::Float(v) => Ok(v),
            other => Err(type_mismatch("float", other)),
        }
    }
}

/// One persisted field: name, type tag, getter and setter.
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    get: fn(&Settings) -> SettingValue,
    set: fn(&mut Settings, SettingValue) -> Result<()>,
}

macro_rules! field {
    ($field:ident, $kind:ident) => {
        Field {
            name: stringify!($field),
            kind: Kind::$kind,
            get: |s| SettingValue::$kind(s.$field),
            set: |s, v| {
                s.$field = v.try_into()?;
                Ok(())
            },
        }
    };
}

/// Persisted fields in on-disk order.
pub const FIELDS: &[Field] = &[
    field!(disable_gui_dialog, Bool),
    field!(max_number_of_group_members, Int),
    field!(max_number_of_groups, Int),
    field!(max_number_of_contacts, Int),
    field!(log_messages_by_default, Bool),
    field!(accept_files_by_default, Bool),
    field!(show_notifications_by_default, Bool),
    field!(log_file_masking, Bool),
    field!(ask_password_for_log_access, Bool),
    field!(nc_bypass_messages, Bool),
    field!(confirm_sent_files, Bool),
    field!(double_space_exits, Bool),
    field!(traffic_masking, Bool),
    field!(tm_static_delay, Float),
    field!(tm_random_delay, Float),
    field!(allow_contact_requests, Bool),
    field!(new_message_notify_preview, Bool),
    field!(new_message_notify_duration, Float),
    field!(max_decompress_size, Int),
];

/// Current database usage that bounds the size limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsContext {
    pub contacts: usize,
    pub groups: usize,
    pub largest_group: usize,
}

/// Round up to the next multiple of ten.
fn round_up(value: usize) -> u64 {
    (value as u64).div_ceil(10) * 10
}

fn invalid(message: impl Into<String>) -> Error {
    Error::recoverable(RecoverableKind::InvalidInput, message)
}

impl Settings {
    /// Encoded length of a settings record.
    pub fn record_len() -> usize {
        FIELDS.iter().map(|f| f.kind.width()).sum()
    }

    pub fn get(&self, name: &str) -> Option<SettingValue> {
        FIELDS.iter().find(|f| f.name == name).map(|f| (f.get)(self))
    }

    /// `(name, value)` for every field in on-disk order.
    pub fn values(&self) -> Vec<(&'static str, SettingValue)> {
        FIELDS.iter().map(|f| (f.name, (f.get)(self))).collect()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::record_len());
        for field in FIELDS {
            match (field.get)(self) {
                SettingValue::Bool(v) => out.extend_from_slice(&bool_to_bytes(v)),
                SettingValue::Int(v) => out.extend_from_slice(&int_to_bytes(v)),
                SettingValue::Float(v) => out.extend_from_slice(&double_to_bytes(v)),
            }
        }
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::record_len() {
            return Err(Error::fatal(
                FatalKind::InvalidLength,
                format!(
                    "settings record must be {} bytes (got {})",
                    Self::record_len(),
                    bytes.len()
                ),
            ));
        }

        let mut settings = Settings::default();
        let mut offset = 0;
        for field in FIELDS {
            let raw = &bytes[offset..offset + field.kind.width()];
            let value = match field.kind {
                Kind::Bool => SettingValue::Bool(bytes_to_bool(raw)?),
                Kind::Int => SettingValue::Int(bytes_to_int(raw)?),
                Kind::Float => SettingValue::Float(bytes_to_double(raw)?),
            };
            (field.set)(&mut settings, value)?;
            offset += field.kind.width();
        }
        Ok(settings)
    }

    /// Parse `value` for the setting `name`, validate it and apply it.
    ///
    /// Unknown names, unparsable values and values that fail validation are
    /// recoverable; the settings are left unchanged.
    pub fn change_setting(&mut self, name: &str, value: &str, ctx: &SettingsContext) -> Result<()> {
        let field = FIELDS
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| invalid(format!("invalid setting '{name}'")))?;

        let value = parse_value(field.kind, value.trim())?;
        validate(name, value, ctx)?;
        (field.set)(self, value)
    }
}

fn parse_value(kind: Kind, text: &str) -> Result<SettingValue> {
    match kind {
        Kind::Bool => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(SettingValue::Bool(true)),
            "false" => Ok(SettingValue::Bool(false)),
            _ => Err(invalid(format!("invalid boolean value '{text}'"))),
        },
        Kind::Int => text
            .parse::<u64>()
            .map(SettingValue::Int)
            .map_err(|_| invalid(format!("invalid integer value '{text}'"))),
        Kind::Float => {
            let v = text
                .parse::<f64>()
                .map_err(|_| invalid(format!("invalid float value '{text}'")))?;
            if !v.is_finite() || v < 0.0 {
                return Err(invalid("float value must be a non-negative number"));
            }
            Ok(SettingValue::Float(v))
        }
    }
}

fn validate(name: &str, value: SettingValue, ctx: &SettingsContext) -> Result<()> {
    match (name, value) {
        ("max_number_of_group_members" | "max_number_of_groups" | "max_number_of_contacts", SettingValue::Int(v)) => {
            if v == 0 || v % 10 != 0 {
                return Err(invalid("database padding settings must be divisible by 10"));
            }
            let (minimum, what) = match name {
                "max_number_of_group_members" => (round_up(ctx.largest_group), "members"),
                "max_number_of_groups" => (round_up(ctx.groups), "groups"),
                _ => (round_up(ctx.contacts), "contacts"),
            };
            if v < minimum {
                return Err(invalid(format!(
                    "can't set the max number of {what} lower than {minimum}"
                )));
            }
        }
        ("new_message_notify_duration", SettingValue::Float(v)) => {
            if v < NEW_MESSAGE_NOTIFY_MIN_DURATION {
                return Err(invalid("too small value for message notify duration"));
            }
        }
        ("tm_static_delay", SettingValue::Float(v)) => {
            if v < TRAFFIC_MASKING_MIN_STATIC_DELAY {
                return Err(invalid(format!(
                    "can't set static delay lower than {TRAFFIC_MASKING_MIN_STATIC_DELAY}"
                )));
            }
            tracing::warn!("changing traffic masking delay can make your endpoint and traffic look unique");
        }
        ("tm_random_delay", SettingValue::Float(v)) => {
            if v < TRAFFIC_MASKING_MIN_RANDOM_DELAY {
                return Err(invalid(format!(
                    "can't set random delay lower than {TRAFFIC_MASKING_MIN_RANDOM_DELAY}"
                )));
            }
            tracing::warn!("changing traffic masking delay can make your endpoint and traffic look unique");
        }
        _ => {}
    }
    Ok(())
}

/// The `<operation>_settings` database.
pub struct SettingsDb<M = DiskMedium> {
    db: BlobStore<AeadSealer, M>,
}

impl SettingsDb<DiskMedium> {
    pub fn new(path: impl Into<PathBuf>, key: SymmetricKey) -> Self {
        Self {
            db: BlobStore::new(path, AeadSealer::new(key)),
        }
    }
}

impl<M: Medium> SettingsDb<M> {
    pub fn with_store(db: BlobStore<AeadSealer, M>) -> Self {
        Self { db }
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Load stored settings, or store and return the defaults on first run.
    pub fn load_or_create(&self) -> Result<Settings> {
        self.db.recover()?;
        if self.db.exists() {
            Settings::deserialize(&self.db.load()?)
        } else {
            let settings = Settings::default();
            self.store(&settings)?;
            Ok(settings)
        }
    }

    pub fn store(&self, settings: &Settings) -> Result<()> {
        self.db.store(&settings.serialize())
    }

    /// Apply one change and persist the result.
    pub fn change_setting(
        &self,
        settings: &mut Settings,
        name: &str,
        value: &str,
        ctx: &SettingsContext,
    ) -> Result<()> {
        let mut updated = settings.clone();
        updated.change_setting(name, value, ctx)?;
        self.store(&updated)?;
        *settings = updated;
        tracing::info!(setting = name, "setting changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_layout() {
        // 12 bools, 4 ints, 3 floats
        assert_eq!(Settings::record_len(), 12 + 4 * 8 + 3 * 8);

        let bytes = Settings::default().serialize();
        assert_eq!(bytes.len(), Settings::record_len());
        assert_eq!(bytes[0], 0, "disable_gui_dialog");
        assert_eq!(&bytes[1..9], &50u64.to_be_bytes(), "max_number_of_group_members");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut settings = Settings::default();
        settings.traffic_masking = true;
        settings.tm_static_delay = 0.75;
        settings.max_number_of_contacts = 120;

        let decoded = Settings::deserialize(&settings.serialize()).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_deserialize_wrong_length() {
        let err = Settings::deserialize(&[0u8; 10]).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidLength));
    }

    #[test]
    fn test_change_setting_parses_types() {
        let ctx = SettingsContext::default();
        let mut s = Settings::default();

        s.change_setting("traffic_masking", "TRUE", &ctx).unwrap();
        s.change_setting("max_number_of_groups", "80", &ctx).unwrap();
        s.change_setting("tm_random_delay", "0.5", &ctx).unwrap();

        assert!(s.traffic_masking);
        assert_eq!(s.max_number_of_groups, 80);
        assert_eq!(s.tm_random_delay, 0.5);
        assert_eq!(s.get("max_number_of_groups"), Some(SettingValue::Int(80)));
    }

    #[test]
    fn test_change_setting_rejections_are_recoverable() {
        let ctx = SettingsContext {
            contacts: 41,
            groups: 3,
            largest_group: 12,
        };
        let cases = [
            ("no_such_setting", "1"),
            ("traffic_masking", "yes"),
            ("max_number_of_contacts", "-10"),
            ("max_number_of_contacts", "55"),
            ("max_number_of_contacts", "0"),
            ("max_number_of_contacts", "40"),
            ("max_number_of_group_members", "10"),
            ("max_number_of_groups", "abc"),
            ("new_message_notify_duration", "0.01"),
            ("tm_static_delay", "0.05"),
            ("tm_random_delay", "NaN"),
        ];

        let mut s = Settings::default();
        for (name, value) in cases {
            let err = s.change_setting(name, value, &ctx).unwrap_err();
            assert_eq!(
                err.recoverable_kind(),
                Some(RecoverableKind::InvalidInput),
                "{name} = {value}"
            );
        }
        assert_eq!(s, Settings::default());

        s.change_setting("max_number_of_contacts", "50", &ctx).unwrap();
        s.change_setting("max_number_of_group_members", "20", &ctx).unwrap();
    }

    #[test]
    fn test_settings_db_load_or_create() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_settings");
        let key = SymmetricKey::from_bytes([3; 32]);

        let db = SettingsDb::new(&path, key.clone());
        let mut settings = db.load_or_create().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        db.change_setting(&mut settings, "log_messages_by_default", "true", &SettingsContext::default())
            .unwrap();

        let reopened = SettingsDb::new(&path, key).load_or_create().unwrap();
        assert!(reopened.log_messages_by_default);
    }

    #[test]
    fn test_failed_change_is_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_settings");
        let key = SymmetricKey::from_bytes([3; 32]);

        let db = SettingsDb::new(&path, key.clone());
        let mut settings = db.load_or_create().unwrap();
        assert!(db
            .change_setting(&mut settings, "tm_static_delay", "0.0", &SettingsContext::default())
            .is_err());
        assert_eq!(settings, Settings::default());
        assert_eq!(SettingsDb::new(&path, key).load_or_create().unwrap(), Settings::default());
    }
}
