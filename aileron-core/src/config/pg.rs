//! Parameter group catalogue
//!
//! Maps a numeric group id to a typed slice of the master record. The
//! stored image stays one monolithic blob; groups are views used by
//! configurator protocols to read, replace or reset one subsystem.

use super::board::BoardDescriptor;
use super::defaults::factory_config;
use super::eeprom::EepromError;
use super::master::MasterConfig;
use super::mixer::{MotorMixer, MAX_SUPPORTED_MOTORS};
use super::profile::Profile;
use super::types::{BlackboxConfig, BoardAlignment, FailsafeConfig, GimbalConfig};

/// Group identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PgId {
    Failsafe = 1,
    BoardAlignment = 2,
    Gimbal = 3,
    MotorMixer = 4,
    Blackbox = 5,
    /// Active tuning profile
    Profile = 254,
    /// Whole record
    Master = 255,
}

impl PgId {
    pub const ALL: [PgId; 7] = [
        PgId::Failsafe,
        PgId::BoardAlignment,
        PgId::Gimbal,
        PgId::MotorMixer,
        PgId::Blackbox,
        PgId::Profile,
        PgId::Master,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| *id as u8 == value)
    }
}

/// Typed contents of one group
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum ParameterGroup {
    Failsafe(FailsafeConfig),
    BoardAlignment(BoardAlignment),
    Gimbal(GimbalConfig),
    MotorMixer([MotorMixer; MAX_SUPPORTED_MOTORS]),
    Blackbox(BlackboxConfig),
    Profile(Profile),
    Master(MasterConfig),
}

impl ParameterGroup {
    pub fn id(&self) -> PgId {
        match self {
            ParameterGroup::Failsafe(_) => PgId::Failsafe,
            ParameterGroup::BoardAlignment(_) => PgId::BoardAlignment,
            ParameterGroup::Gimbal(_) => PgId::Gimbal,
            ParameterGroup::MotorMixer(_) => PgId::MotorMixer,
            ParameterGroup::Blackbox(_) => PgId::Blackbox,
            ParameterGroup::Profile(_) => PgId::Profile,
            ParameterGroup::Master(_) => PgId::Master,
        }
    }

    /// Serialize the group payload into `out`, returning the used length
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, EepromError> {
        let used = match self {
            ParameterGroup::Failsafe(v) => postcard::to_slice(v, out),
            ParameterGroup::BoardAlignment(v) => postcard::to_slice(v, out),
            ParameterGroup::Gimbal(v) => postcard::to_slice(v, out),
            ParameterGroup::MotorMixer(v) => postcard::to_slice(v, out),
            ParameterGroup::Blackbox(v) => postcard::to_slice(v, out),
            ParameterGroup::Profile(v) => postcard::to_slice(v, out),
            ParameterGroup::Master(v) => postcard::to_slice(v, out),
        };
        match used {
            Ok(bytes) => Ok(bytes.len()),
            Err(postcard::Error::SerializeBufferFull) => Err(EepromError::TooLarge),
            Err(_) => Err(EepromError::Encode),
        }
    }

    /// Parse a payload produced by [`ParameterGroup::encode`]
    pub fn decode(id: PgId, bytes: &[u8]) -> Result<Self, EepromError> {
        fn parse<'a, T: serde::Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, EepromError> {
            postcard::from_bytes(bytes).map_err(|_| EepromError::Decode)
        }

        Ok(match id {
            PgId::Failsafe => ParameterGroup::Failsafe(parse(bytes)?),
            PgId::BoardAlignment => ParameterGroup::BoardAlignment(parse(bytes)?),
            PgId::Gimbal => ParameterGroup::Gimbal(parse(bytes)?),
            PgId::MotorMixer => ParameterGroup::MotorMixer(parse(bytes)?),
            PgId::Blackbox => ParameterGroup::Blackbox(parse(bytes)?),
            PgId::Profile => ParameterGroup::Profile(parse(bytes)?),
            PgId::Master => ParameterGroup::Master(parse(bytes)?),
        })
    }
}

/// Copy a group out of the record
pub fn read(record: &MasterConfig, id: PgId) -> ParameterGroup {
    match id {
        PgId::Failsafe => ParameterGroup::Failsafe(record.failsafe),
        PgId::BoardAlignment => ParameterGroup::BoardAlignment(record.board_alignment),
        PgId::Gimbal => ParameterGroup::Gimbal(record.current_profile().gimbal),
        PgId::MotorMixer => ParameterGroup::MotorMixer(record.custom_motor_mixer),
        PgId::Blackbox => ParameterGroup::Blackbox(record.blackbox),
        PgId::Profile => ParameterGroup::Profile(*record.current_profile()),
        PgId::Master => ParameterGroup::Master(record.clone()),
    }
}

/// Replace a group in the record
///
/// Profile and gimbal groups land in the active profile.
pub fn write(record: &mut MasterConfig, group: ParameterGroup) {
    match group {
        ParameterGroup::Failsafe(v) => record.failsafe = v,
        ParameterGroup::BoardAlignment(v) => record.board_alignment = v,
        ParameterGroup::Gimbal(v) => record.current_profile_mut().gimbal = v,
        ParameterGroup::MotorMixer(v) => record.custom_motor_mixer = v,
        ParameterGroup::Blackbox(v) => record.blackbox = v,
        ParameterGroup::Profile(v) => *record.current_profile_mut() = v,
        ParameterGroup::Master(v) => *record = v,
    }
}

/// Factory contents of a group on `board`
pub fn default_for(id: PgId, board: &BoardDescriptor) -> ParameterGroup {
    read(&factory_config(board), id)
}

/// Restore one group to its factory contents
pub fn reset(record: &mut MasterConfig, id: PgId, board: &BoardDescriptor) {
    let mut group = default_for(id, board);
    // the active profile keeps its slot-specific rate profile index
    if let ParameterGroup::Profile(profile) = &mut group {
        profile.default_rate_profile_index = record.current_profile().default_rate_profile_index;
    }
    write(record, group);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::board::BoardId;
    use crate::config::types::{BlackboxDevice, GimbalMode};

    #[test]
    fn test_ids_are_stable() {
        assert_eq!(PgId::from_u8(1), Some(PgId::Failsafe));
        assert_eq!(PgId::from_u8(4), Some(PgId::MotorMixer));
        assert_eq!(PgId::from_u8(254), Some(PgId::Profile));
        assert_eq!(PgId::from_u8(255), Some(PgId::Master));
        assert_eq!(PgId::from_u8(0), None);
        assert_eq!(PgId::from_u8(6), None);
        for id in PgId::ALL {
            assert_eq!(PgId::from_u8(id as u8), Some(id));
        }
    }

    #[test]
    fn test_gimbal_targets_active_profile() {
        let board = BoardId::Naze.descriptor();
        let mut record = factory_config(board);
        record.current_profile_index = 1;

        write(
            &mut record,
            ParameterGroup::Gimbal(GimbalConfig {
                mode: GimbalMode::MixTilt,
            }),
        );
        assert_eq!(record.profiles[1].gimbal.mode, GimbalMode::MixTilt);
        assert_eq!(record.profiles[0].gimbal.mode, GimbalMode::Normal);
        assert_eq!(read(&record, PgId::Gimbal).id(), PgId::Gimbal);
    }

    #[test]
    fn test_reset_one_group() {
        let board = BoardId::SpRacingF3.descriptor();
        let mut record = factory_config(board);
        record.blackbox.device = BlackboxDevice::Serial;
        record.failsafe.failsafe_delay = 99;

        reset(&mut record, PgId::Blackbox, board);
        assert_eq!(record.blackbox.device, BlackboxDevice::Flash);
        assert_eq!(record.failsafe.failsafe_delay, 99);
    }

    #[test]
    fn test_profile_reset_keeps_rate_index() {
        let board = BoardId::Naze.descriptor();
        let mut record = factory_config(board);
        record.current_profile_index = 2;
        record.profiles[2].pid.p8[0] = 1;

        reset(&mut record, PgId::Profile, board);
        assert_eq!(record.profiles[2].pid.p8[0], 45);
        assert_eq!(record.profiles[2].default_rate_profile_index, 2);
    }

    #[test]
    fn test_group_payload_transfer() {
        let board = BoardId::AlienWiiF1.descriptor();
        let record = factory_config(board);
        let mut buf = [0u8; 256];

        let group = read(&record, PgId::MotorMixer);
        let len = group.encode(&mut buf).unwrap();
        assert_eq!(ParameterGroup::decode(PgId::MotorMixer, &buf[..len]), Ok(group));

        assert_eq!(
            ParameterGroup::decode(PgId::Failsafe, &[]),
            Err(EepromError::Decode)
        );
    }

    #[test]
    fn test_master_group_too_large_for_small_buffer() {
        let record = factory_config(BoardId::Naze.descriptor());
        let mut buf = [0u8; 32];
        assert_eq!(
            read(&record, PgId::Master).encode(&mut buf),
            Err(EepromError::TooLarge)
        );
    }
}
