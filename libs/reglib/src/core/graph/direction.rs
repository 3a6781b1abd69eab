use serde::{Deserialize, Serialize};

/// Compass anchor for a connector endpoint.
///
/// Directions are purely a rendering anchor: derivation only compares them
/// when grouping connectors into fan-out slots. Serialized as the integer
/// codes machine files have always used, so saved machines keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Direction {
    None,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    /// Anchor at the right edge of a wide text node (START/HALT).
    EastText,
    /// Anchor at the left edge of a wide text node (START/HALT).
    WestText,
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> u8 {
        match direction {
            Direction::None => 0,
            Direction::North => 1,
            Direction::NorthEast => 2,
            Direction::East => 3,
            Direction::SouthEast => 4,
            Direction::South => 5,
            Direction::SouthWest => 6,
            Direction::West => 7,
            Direction::NorthWest => 8,
            Direction::EastText => 9,
            Direction::WestText => 10,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::None),
            1 => Ok(Direction::North),
            2 => Ok(Direction::NorthEast),
            3 => Ok(Direction::East),
            4 => Ok(Direction::SouthEast),
            5 => Ok(Direction::South),
            6 => Ok(Direction::SouthWest),
            7 => Ok(Direction::West),
            8 => Ok(Direction::NorthWest),
            9 => Ok(Direction::EastText),
            10 => Ok(Direction::WestText),
            other => Err(format!("Unknown direction code: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serde_round_trip() {
        for code in 0u8..=10 {
            let direction = Direction::try_from(code).unwrap();
            let json = serde_json::to_string(&direction).unwrap();
            assert_eq!(json, code.to_string());
            let back: Direction = serde_json::from_str(&json).unwrap();
            assert_eq!(back, direction);
        }
    }

    #[test]
    fn test_direction_unknown_code_rejected() {
        assert!(serde_json::from_str::<Direction>("11").is_err());
        assert!(Direction::try_from(255).is_err());
    }
}
