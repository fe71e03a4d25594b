use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status values are a single enum everywhere. The database stores the
/// lowercase string form; comparisons never happen on raw strings.
macro_rules! status_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} value: {}", stringify!($name), other)),
                }
            }
        }
    };
}

status_enum!(UserRole {
    User => "user",
    Admin => "admin",
});

status_enum!(FriendshipStatus {
    Pending => "pending",
    Accepted => "accepted",
    Blocked => "blocked",
});

status_enum!(DonationType {
    Blood => "blood",
    Plasma => "plasma",
});

status_enum!(DonationStatus {
    Pending => "pending",
    Completed => "completed",
    Rejected => "rejected",
    Cancelled => "cancelled",
});

status_enum!(ChallengeStatus {
    Pending => "pending",
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl DonationStatus {
    /// Cancelled and rejected donations never count toward a challenge total.
    pub fn counts_toward_challenges(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_strings() {
        assert_eq!("accepted".parse::<FriendshipStatus>().unwrap(), FriendshipStatus::Accepted);
        assert_eq!(FriendshipStatus::Blocked.as_str(), "blocked");
        assert!("ACCEPTED".parse::<FriendshipStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&DonationType::Plasma).unwrap();
        assert_eq!(json, "\"plasma\"");
        let back: DonationStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, DonationStatus::Cancelled);
    }

    #[test]
    fn challenge_counting_policy() {
        assert!(DonationStatus::Pending.counts_toward_challenges());
        assert!(DonationStatus::Completed.counts_toward_challenges());
        assert!(!DonationStatus::Rejected.counts_toward_challenges());
        assert!(!DonationStatus::Cancelled.counts_toward_challenges());
    }
}
