#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    #[default]
    Q10,
    Category10,
    Category20,
    Set1,
    Set2,
    Set3,
    Dark2,
    Paired,
    Pastel1,
    Pastel2,
}

/// Positional fallback for master colors.
pub const FALLBACK_COLORS: &[&str] = CATEGORY10;

const Q10: &[&str] = &[
    "#767DF2", "#BF2B17", "#F25C06", "#65AA88", "#039289", "#1A778B", "#FA8907", "#F7BB02",
    "#D5BD4B", "#17becf",
];
const CATEGORY10: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];
const CATEGORY20: &[&str] = &[
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];
const SET1: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];
const SET2: &[&str] = &[
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];
const SET3: &[&str] = &[
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];
const DARK2: &[&str] = &[
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];
const PAIRED: &[&str] = &[
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
];
const PASTEL1: &[&str] = &[
    "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
    "#f2f2f2",
];
const PASTEL2: &[&str] = &[
    "#b3e2cd", "#fdcdac", "#cbd5e8", "#f4cae4", "#e6f5c9", "#fff2ae", "#f1e2cc", "#cccccc",
];

impl Palette {
    pub const ALL: [Palette; 10] = [
        Self::Q10,
        Self::Category10,
        Self::Category20,
        Self::Set1,
        Self::Set2,
        Self::Set3,
        Self::Dark2,
        Self::Paired,
        Self::Pastel1,
        Self::Pastel2,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|palette| palette.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Q10 => "Q10",
            Self::Category10 => "category10",
            Self::Category20 => "category20",
            Self::Set1 => "set1",
            Self::Set2 => "set2",
            Self::Set3 => "set3",
            Self::Dark2 => "dark2",
            Self::Paired => "paired",
            Self::Pastel1 => "pastel1",
            Self::Pastel2 => "pastel2",
        }
    }

    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Self::Q10 => Q10,
            Self::Category10 => CATEGORY10,
            Self::Category20 => CATEGORY20,
            Self::Set1 => SET1,
            Self::Set2 => SET2,
            Self::Set3 => SET3,
            Self::Dark2 => DARK2,
            Self::Paired => PAIRED,
            Self::Pastel1 => PASTEL1,
            Self::Pastel2 => PASTEL2,
        }
    }

    pub fn color(self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_hold_between_eight_and_twenty_colors() {
        for palette in Palette::ALL {
            let len = palette.colors().len();
            assert!((8..=20).contains(&len), "{} has {len}", palette.name());
        }
        assert_eq!(Palette::default().colors().len(), 10);
    }

    #[test]
    fn names_round_trip_and_unknown_names_are_rejected() {
        for palette in Palette::ALL {
            assert_eq!(Palette::from_name(palette.name()), Some(palette));
        }
        assert_eq!(Palette::from_name("viridis"), None);
    }

    #[test]
    fn color_index_wraps() {
        assert_eq!(Palette::Set2.color(8), Palette::Set2.color(0));
        assert_eq!(Palette::Q10.color(11), "#BF2B17");
    }
}
