/// Capabilities the host's module registry asks plugins about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Feature {
    ModIntro,
    ShowDescription,
    Groups,
    Groupings,
    CompletionTracksViews,
    GradeHasGrade,
    BackupMoodle2,
    ModPurpose,
    Other(String),
}

impl Feature {
    pub fn from_name(name: &str) -> Self {
        match name {
            "mod_intro" => Self::ModIntro,
            "showdescription" => Self::ShowDescription,
            "groups" => Self::Groups,
            "groupings" => Self::Groupings,
            "completion_tracks_views" => Self::CompletionTracksViews,
            "grade_has_grade" => Self::GradeHasGrade,
            "backup_moodle2" => Self::BackupMoodle2,
            "mod_purpose" => Self::ModPurpose,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ModIntro => "mod_intro",
            Self::ShowDescription => "showdescription",
            Self::Groups => "groups",
            Self::Groupings => "groupings",
            Self::CompletionTracksViews => "completion_tracks_views",
            Self::GradeHasGrade => "grade_has_grade",
            Self::BackupMoodle2 => "backup_moodle2",
            Self::ModPurpose => "mod_purpose",
            Self::Other(name) => name,
        }
    }
}

/// `Some(true)` for supported features, `None` for anything the plugin has no
/// opinion on. It never answers `Some(false)`.
pub fn ack_supports(feature: &Feature) -> Option<bool> {
    match feature {
        Feature::ModIntro | Feature::ShowDescription => Some(true),
        _ => None,
    }
}
