//! Property tests for the feature compatibility matrix and image codec

use aileron_core::config::eeprom::{self, EEPROM_CONF_VERSION};
use aileron_core::config::profile::{MAX_CONTROL_RATE_PROFILE_COUNT, MAX_PROFILE_COUNT};
use aileron_core::config::{
    factory_config, validate_and_fix_config, BoardId, Features, MasterConfig,
};
use aileron_hal::flash::CONFIG_WINDOW_SIZE;
use proptest::prelude::*;

/// Receiver variants from highest to lowest precedence
const RX_PRECEDENCE: [Features; 4] = [
    Features::RX_MSP,
    Features::RX_SERIAL,
    Features::RX_PPM,
    Features::RX_PARALLEL_PWM,
];

fn board() -> impl Strategy<Value = BoardId> {
    (0..BoardId::ALL.len()).prop_map(|i| BoardId::ALL[i])
}

prop_compose! {
    fn scrambled_record()(
        id in board(),
        features in any::<u32>(),
        profile in any::<u8>(),
        rate_profiles in prop::array::uniform3(any::<u8>()),
        looptime in any::<u16>(),
        denominator in any::<u8>(),
        telemetry_inversion in any::<bool>(),
    ) -> (BoardId, MasterConfig) {
        let mut record = factory_config(id.descriptor());
        record.enabled_features = Features::from_bits_truncate(features);
        record.current_profile_index = profile;
        for (p, index) in record.profiles.iter_mut().zip(rate_profiles) {
            p.default_rate_profile_index = index;
        }
        record.looptime = looptime;
        record.gyro_sync_denominator = denominator;
        record.telemetry.telemetry_inversion = telemetry_inversion;
        (id, record)
    }
}

proptest! {
    #[test]
    fn validate_is_idempotent((id, mut record) in scrambled_record()) {
        let board = id.descriptor();
        validate_and_fix_config(&mut record, board);
        let once = record.clone();
        validate_and_fix_config(&mut record, board);
        prop_assert_eq!(record, once);
    }

    #[test]
    fn exactly_one_receiver_survives((id, mut record) in scrambled_record()) {
        validate_and_fix_config(&mut record, id.descriptor());
        let rx = record.enabled_features & Features::RX_VARIANTS;
        prop_assert_eq!(rx.bits().count_ones(), 1);
    }

    #[test]
    fn profile_indexes_in_range((id, mut record) in scrambled_record()) {
        validate_and_fix_config(&mut record, id.descriptor());
        prop_assert!((record.current_profile_index as usize) < MAX_PROFILE_COUNT);
        for profile in record.profiles.iter() {
            prop_assert!(
                (profile.default_rate_profile_index as usize) < MAX_CONTROL_RATE_PROFILE_COUNT
            );
        }
    }

    #[test]
    fn higher_receiver_wins(id in board(), a in 0usize..4, b in 0usize..4) {
        prop_assume!(a != b);
        let mut record = factory_config(id.descriptor());
        record.enabled_features.remove(Features::RX_VARIANTS);
        record.enabled_features.insert(RX_PRECEDENCE[a] | RX_PRECEDENCE[b]);

        validate_and_fix_config(&mut record, id.descriptor());
        let winner = RX_PRECEDENCE[a.min(b)];
        prop_assert_eq!(record.enabled_features & Features::RX_VARIANTS, winner);
    }

    #[test]
    fn foreign_version_is_rejected(id in board(), version in any::<u8>()) {
        prop_assume!(version != EEPROM_CONF_VERSION);
        let mut record = factory_config(id.descriptor());
        let mut image = [0xFFu8; CONFIG_WINDOW_SIZE];
        let len = eeprom::stamp(&mut record, &mut image).unwrap();

        // keep the checksum intact so only the version is wrong
        image[0] = version;
        image[5] ^= EEPROM_CONF_VERSION ^ version;
        prop_assert_eq!(eeprom::xor_checksum(&image[..len]), 0);
        prop_assert!(!eeprom::is_valid(&image));
    }

    #[test]
    fn single_byte_corruption_is_rejected(id in board(), offset in 0usize..64, flip in 1u8..) {
        let mut record = factory_config(id.descriptor());
        let mut image = [0xFFu8; CONFIG_WINDOW_SIZE];
        let len = eeprom::stamp(&mut record, &mut image).unwrap();
        let offset = offset % len;

        image[offset] ^= flip;
        prop_assert!(!eeprom::is_valid(&image));
    }
}
