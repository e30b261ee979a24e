use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(CampaignId);
id_newtype!(UserId);

/// Presentation style applied to a campaign preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    #[default]
    Modern,
    Minimal,
    Bold,
    Nature,
    Ocean,
    Sunset,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Template::Modern,
        Template::Minimal,
        Template::Bold,
        Template::Nature,
        Template::Ocean,
        Template::Sunset,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Template::Modern => "Modern",
            Template::Minimal => "Minimal",
            Template::Bold => "Bold",
            Template::Nature => "Nature",
            Template::Ocean => "Ocean",
            Template::Sunset => "Sunset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|template| template.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Facebook,
    Twitter,
    Instagram,
    Linkedin,
}

impl SocialPlatform {
    pub fn name(self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Linkedin => "LinkedIn",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "facebook" => Some(SocialPlatform::Facebook),
            "twitter" | "x" => Some(SocialPlatform::Twitter),
            "instagram" => Some(SocialPlatform::Instagram),
            "linkedin" => Some(SocialPlatform::Linkedin),
            _ => None,
        }
    }
}
