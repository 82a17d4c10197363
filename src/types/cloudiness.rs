//! Defines the `Cloudiness` enum, mapping the diary's sky-condition icons to
//! the labels stored in the raw CSV.

/// Sky condition for one reading of the diary table.
///
/// The diary shows cloudiness as an icon. The icon file name is resolved with
/// [`Cloudiness::from_icon`], and the resulting label is what ends up in the raw
/// CSV (see [`Cloudiness::label`]).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Cloudiness {
    /// `sun.png`
    Clear,
    /// `sunc.png`
    PartlyCloudy,
    /// `suncl.png`
    Variable,
    /// `dull.png`
    Overcast,
    /// An icon was present but its file name is not one we know.
    Unknown,
    /// The cell had no icon at all.
    NoData,
}

/// Icon file name to cloudiness, as published on the diary pages.
const ICON_MAP: [(&str, Cloudiness); 4] = [
    ("sun.png", Cloudiness::Clear),
    ("sunc.png", Cloudiness::PartlyCloudy),
    ("suncl.png", Cloudiness::Variable),
    ("dull.png", Cloudiness::Overcast),
];

impl Cloudiness {
    /// The four categories the preprocessor one-hot encodes, in column order.
    pub const CANONICAL: [Cloudiness; 4] = [
        Cloudiness::Clear,
        Cloudiness::PartlyCloudy,
        Cloudiness::Variable,
        Cloudiness::Overcast,
    ];

    /// Resolves the `src` attribute of a cloudiness `<img>`.
    ///
    /// Only the final path segment is considered, so both absolute URLs and
    /// relative paths work.
    ///
    /// # Examples
    ///
    /// ```
    /// use weather_diary::Cloudiness;
    ///
    /// assert_eq!(Cloudiness::from_icon("//st.gismeteo.ru/img/sunc.png"), Cloudiness::PartlyCloudy);
    /// assert_eq!(Cloudiness::from_icon("rain.png"), Cloudiness::Unknown);
    /// ```
    pub fn from_icon(src: &str) -> Self {
        let file_name = src.rsplit('/').next().unwrap_or(src);
        ICON_MAP
            .iter()
            .find(|(icon, _)| *icon == file_name)
            .map(|(_, cloudiness)| *cloudiness)
            .unwrap_or(Cloudiness::Unknown)
    }

    /// The Russian label written to the raw CSV.
    pub fn label(&self) -> &'static str {
        match self {
            Cloudiness::Clear => "Ясно",
            Cloudiness::PartlyCloudy => "Малооблачно",
            Cloudiness::Variable => "Переменная облачность",
            Cloudiness::Overcast => "Пасмурно",
            Cloudiness::Unknown => "Неизвестно",
            Cloudiness::NoData => "Нет данных",
        }
    }

    /// Suffix used by the translated column vocabulary, e.g. `cloudiness_day_partly_cloudy`.
    pub fn english(&self) -> &'static str {
        match self {
            Cloudiness::Clear => "clear",
            Cloudiness::PartlyCloudy => "partly_cloudy",
            Cloudiness::Variable => "variable",
            Cloudiness::Overcast => "overcast",
            Cloudiness::Unknown => "unknown",
            Cloudiness::NoData => "no_data",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [
            Cloudiness::Clear,
            Cloudiness::PartlyCloudy,
            Cloudiness::Variable,
            Cloudiness::Overcast,
            Cloudiness::Unknown,
            Cloudiness::NoData,
        ]
        .into_iter()
        .find(|c| c.label() == label)
    }
}
