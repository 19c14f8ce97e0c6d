//! # Room Profiles
//!
//! Each selectable room is a hand-tuned set of reverb settings. These are
//! calibration data: the numbers were chosen by ear, not derived from
//! room dimensions.
//!
//! "None" is special. It bypasses the reverb completely (dry 1, wet 0) so
//! the bleed reaches the mix with only the distance delay and filtering.

use nih_plug::prelude::*;

use crate::dsp::reverb::ReverbParameters;

/// The room the sidechain source is imagined to be playing in.
///
/// The `#[id]`s are what gets saved with a session. Never change them;
/// display names can be changed freely.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    #[id = "none"]
    #[name = "None"]
    None,
    #[id = "living-room"]
    #[name = "Living Room"]
    LivingRoom,
    #[id = "studio"]
    #[name = "Studio"]
    Studio,
    #[id = "garage"]
    #[name = "Garage"]
    Garage,
    #[id = "concert-hall"]
    #[name = "Concert Hall"]
    ConcertHall,
    #[id = "club"]
    #[name = "Club"]
    Club,
    #[id = "parking-garage"]
    #[name = "Parking Garage"]
    ParkingGarage,
    #[id = "football-field"]
    #[name = "Football Field"]
    FootballField,
    #[id = "arena"]
    #[name = "Arena"]
    Arena,
    #[id = "hallway"]
    #[name = "Hallway"]
    Hallway,
    #[id = "bathroom"]
    #[name = "Bathroom"]
    Bathroom,
    #[id = "small-closet"]
    #[name = "Small Closet"]
    SmallCloset,
    #[id = "large-ballroom"]
    #[name = "Large Ballroom"]
    LargeBallroom,
    #[id = "outer-space"]
    #[name = "Outer Space"]
    OuterSpace,
    #[id = "phone-booth"]
    #[name = "Phone Booth"]
    PhoneBooth,
    #[id = "concrete-pipe"]
    #[name = "Concrete Pipe"]
    ConcretePipe,
    #[id = "deep-well"]
    #[name = "Deep Well"]
    DeepWell,
    #[id = "cathedral"]
    #[name = "Cathedral"]
    Cathedral,
    #[id = "inside-a-guitar"]
    #[name = "Inside a Guitar"]
    InsideAGuitar,
    #[id = "nuclear-silo"]
    #[name = "Nuclear Silo"]
    NuclearSilo,
    #[id = "underwater"]
    #[name = "Underwater"]
    Underwater,
}

/// Number of selectable rooms, "None" included.
pub const NUM_ROOMS: usize = 21;

impl RoomType {
    /// Look up a room by selector index. Indices past the end select the
    /// last room.
    pub fn from_selector(index: usize) -> Self {
        Self::from_index(index.min(NUM_ROOMS - 1))
    }

    /// Reverb settings for this room.
    pub fn profile(self) -> ReverbParameters {
        // (room size, damping, width)
        let (room_size, damping, width) = match self {
            RoomType::None => return ReverbParameters::BYPASS,
            RoomType::LivingRoom => (0.42, 0.58, 0.68),
            RoomType::Studio => (0.16, 0.88, 0.32),
            RoomType::Garage => (0.58, 0.32, 0.82),
            RoomType::ConcertHall => (0.94, 0.28, 1.00),
            RoomType::Club => (0.72, 0.48, 0.88),
            RoomType::ParkingGarage => (0.86, 0.18, 0.72),
            RoomType::FootballField => (0.99, 0.78, 1.00),
            RoomType::Arena => (0.96, 0.42, 0.96),
            RoomType::Hallway => (0.62, 0.44, 0.12),
            RoomType::Bathroom => (0.28, 0.12, 0.65),
            RoomType::SmallCloset => (0.07, 0.97, 0.12),
            RoomType::LargeBallroom => (0.89, 0.46, 0.92),
            RoomType::OuterSpace => (1.00, 0.05, 1.00),
            RoomType::PhoneBooth => (0.04, 0.72, 0.18),
            RoomType::ConcretePipe => (0.64, 0.08, 0.32),
            RoomType::DeepWell => (0.82, 0.04, 0.38),
            RoomType::Cathedral => (0.98, 0.32, 1.00),
            RoomType::InsideAGuitar => (0.32, 0.38, 0.96),
            RoomType::NuclearSilo => (0.97, 0.08, 0.82),
            RoomType::Underwater => (0.62, 1.00, 0.38),
        };

        ReverbParameters {
            room_size,
            damping,
            width,
            dry_level: 0.0,
            wet_level: 1.0,
        }
    }
}

/// Reverb settings for a room selector index.
pub fn room_profile(index: usize) -> ReverbParameters {
    RoomType::from_selector(index).profile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_bypass() {
        assert_eq!(room_profile(0), ReverbParameters::BYPASS);
        let p = RoomType::None.profile();
        assert_eq!((p.dry_level, p.wet_level), (1.0, 0.0));
    }

    #[test]
    fn test_every_room_is_fully_wet_and_in_range() {
        for index in 1..NUM_ROOMS {
            let p = room_profile(index);
            assert_eq!((p.dry_level, p.wet_level), (0.0, 1.0), "room {index}");
            for v in [p.room_size, p.damping, p.width] {
                assert!((0.0..=1.0).contains(&v), "room {index} has {v}");
            }
        }
    }

    #[test]
    fn test_selector_order_matches_names() {
        assert_eq!(RoomType::variants().len(), NUM_ROOMS);
        assert_eq!(RoomType::variants()[0], "None");
        assert_eq!(RoomType::variants()[1], "Living Room");
        assert_eq!(RoomType::variants()[20], "Underwater");
        assert_eq!(RoomType::from_selector(10), RoomType::Bathroom);
        assert_eq!(RoomType::OuterSpace.to_index(), 13);
    }

    #[test]
    fn test_calibration_values() {
        let bathroom = room_profile(10);
        assert_eq!(
            (bathroom.room_size, bathroom.damping, bathroom.width),
            (0.28, 0.12, 0.65)
        );

        let space = RoomType::OuterSpace.profile();
        assert_eq!((space.room_size, space.damping, space.width), (1.0, 0.05, 1.0));

        let underwater = RoomType::Underwater.profile();
        assert_eq!(underwater.damping, 1.0);
    }

    #[test]
    fn test_out_of_range_index_clamps() {
        assert_eq!(RoomType::from_selector(99), RoomType::Underwater);
        assert_eq!(room_profile(21), RoomType::Underwater.profile());
    }

    #[test]
    fn test_ids_are_unique() {
        let ids = RoomType::ids().expect("every room has a stable id");
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), NUM_ROOMS);
    }
}
