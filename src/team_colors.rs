#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitColors {
    pub primary: &'static str,
    pub secondary: &'static str,
}

pub const FALLBACK_COLORS: KitColors = KitColors {
    primary: "#888888",
    secondary: "#FFFFFF",
};

struct TeamColorEntry {
    team_id: u32,
    colors: KitColors,
}

// Keyed by FPL team id for the 2024/25 season.
static TEAM_COLORS: &[TeamColorEntry] = &[
    TeamColorEntry { team_id: 1, colors: KitColors { primary: "#EF0107", secondary: "#FFFFFF" } }, // Arsenal
    TeamColorEntry { team_id: 2, colors: KitColors { primary: "#95BFE5", secondary: "#670E36" } }, // Aston Villa
    TeamColorEntry { team_id: 3, colors: KitColors { primary: "#DA291C", secondary: "#000000" } }, // Bournemouth
    TeamColorEntry { team_id: 4, colors: KitColors { primary: "#E30613", secondary: "#FBB800" } }, // Brentford
    TeamColorEntry { team_id: 5, colors: KitColors { primary: "#0057B8", secondary: "#FFFFFF" } }, // Brighton
    TeamColorEntry { team_id: 6, colors: KitColors { primary: "#034694", secondary: "#FFFFFF" } }, // Chelsea
    TeamColorEntry { team_id: 7, colors: KitColors { primary: "#1B458F", secondary: "#C4122E" } }, // Crystal Palace
    TeamColorEntry { team_id: 8, colors: KitColors { primary: "#003399", secondary: "#FFFFFF" } }, // Everton
    TeamColorEntry { team_id: 9, colors: KitColors { primary: "#FFFFFF", secondary: "#000000" } }, // Fulham
    TeamColorEntry { team_id: 10, colors: KitColors { primary: "#0044FF", secondary: "#FFFFFF" } }, // Ipswich
    TeamColorEntry { team_id: 11, colors: KitColors { primary: "#003090", secondary: "#FDBE11" } }, // Leicester
    TeamColorEntry { team_id: 12, colors: KitColors { primary: "#C8102E", secondary: "#FFFFFF" } }, // Liverpool
    TeamColorEntry { team_id: 13, colors: KitColors { primary: "#6CABDD", secondary: "#FFFFFF" } }, // Man City
    TeamColorEntry { team_id: 14, colors: KitColors { primary: "#DA291C", secondary: "#FBE122" } }, // Man Utd
    TeamColorEntry { team_id: 15, colors: KitColors { primary: "#241F20", secondary: "#FFFFFF" } }, // Newcastle
    TeamColorEntry { team_id: 16, colors: KitColors { primary: "#DD0000", secondary: "#FFFFFF" } }, // Nott'm Forest
    TeamColorEntry { team_id: 17, colors: KitColors { primary: "#D71920", secondary: "#FFFFFF" } }, // Southampton
    TeamColorEntry { team_id: 18, colors: KitColors { primary: "#FFFFFF", secondary: "#132257" } }, // Spurs
    TeamColorEntry { team_id: 19, colors: KitColors { primary: "#7A263A", secondary: "#1BB1E7" } }, // West Ham
    TeamColorEntry { team_id: 20, colors: KitColors { primary: "#FDB913", secondary: "#231F20" } }, // Wolves
];

pub fn colors_for(team_id: u32) -> KitColors {
    TEAM_COLORS
        .iter()
        .find(|entry| entry.team_id == team_id)
        .map(|entry| entry.colors)
        .unwrap_or(FALLBACK_COLORS)
}
