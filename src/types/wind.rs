//! Wind readings as the diary prints them: a compass token followed by a speed
//! in metres per second, e.g. `СЗ 3м/с`.

/// Unit marker trailing the speed.
pub const SPEED_UNIT: &str = "м/с";

/// The 8-point compass in the order the indicator columns are emitted.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WindDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl WindDirection {
    pub const ALL: [WindDirection; 8] = [
        WindDirection::North,
        WindDirection::NorthEast,
        WindDirection::East,
        WindDirection::SouthEast,
        WindDirection::South,
        WindDirection::SouthWest,
        WindDirection::West,
        WindDirection::NorthWest,
    ];

    /// Cyrillic abbreviation used by the diary and in indicator column names.
    pub fn token(&self) -> &'static str {
        match self {
            WindDirection::North => "С",
            WindDirection::NorthEast => "СВ",
            WindDirection::East => "В",
            WindDirection::SouthEast => "ЮВ",
            WindDirection::South => "Ю",
            WindDirection::SouthWest => "ЮЗ",
            WindDirection::West => "З",
            WindDirection::NorthWest => "СЗ",
        }
    }

    /// Lowercase English abbreviation used by the translated column vocabulary.
    pub fn english(&self) -> &'static str {
        match self {
            WindDirection::North => "n",
            WindDirection::NorthEast => "ne",
            WindDirection::East => "e",
            WindDirection::SouthEast => "se",
            WindDirection::South => "s",
            WindDirection::SouthWest => "sw",
            WindDirection::West => "w",
            WindDirection::NorthWest => "nw",
        }
    }

    /// Exact, case-sensitive match against [`WindDirection::token`].
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }
}

/// A parsed wind cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    pub direction: Option<WindDirection>,
    /// Metres per second; `0.0` when the cell carries no usable speed.
    pub speed: f64,
}

impl Wind {
    /// Parses a raw wind cell.
    ///
    /// The speed is the last whitespace-separated token once the `м/с` marker is
    /// removed, and only when the marker was present. The direction is the first
    /// token. Calm (`Ш`) and empty cells parse to no direction and zero speed.
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_diary::{Wind, WindDirection};
    ///
    /// let wind = Wind::parse("СЗ 3м/с");
    /// assert_eq!(wind.direction, Some(WindDirection::NorthWest));
    /// assert_eq!(wind.speed, 3.0);
    /// ```
    pub fn parse(cell: &str) -> Self {
        let direction = cell
            .split_whitespace()
            .next()
            .and_then(WindDirection::from_token);

        let speed = if cell.contains(SPEED_UNIT) {
            cell.replace(SPEED_UNIT, " ")
                .split_whitespace()
                .last()
                .and_then(|token| token.replace(',', ".").parse::<f64>().ok())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Self { direction, speed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attached_unit() {
        let wind = Wind::parse("ЮВ 4м/с");
        assert_eq!(wind.direction, Some(WindDirection::SouthEast));
        assert_eq!(wind.speed, 4.0);
    }

    #[test]
    fn test_parse_detached_unit() {
        let wind = Wind::parse("С 5 м/с");
        assert_eq!(wind.direction, Some(WindDirection::North));
        assert_eq!(wind.speed, 5.0);
    }

    #[test]
    fn test_parse_calm_and_empty() {
        assert_eq!(
            Wind::parse("Ш"),
            Wind {
                direction: None,
                speed: 0.0
            }
        );
        assert_eq!(
            Wind::parse(""),
            Wind {
                direction: None,
                speed: 0.0
            }
        );
    }

    #[test]
    fn test_direction_is_case_sensitive() {
        assert_eq!(Wind::parse("сз 2м/с").direction, None);
        assert_eq!(Wind::parse("сз 2м/с").speed, 2.0);
    }

    #[test]
    fn test_unparseable_speed_is_zero() {
        assert_eq!(Wind::parse("З ?м/с").speed, 0.0);
    }
}
