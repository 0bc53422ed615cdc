use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier. Allocated by the store of record.
pub type UserId = i64;

/// A registered account.
///
/// Relationship sets (likes sent/received, matches, seen profiles) live in
/// their own join tables and are queried through the store, never embedded
/// here as mutable arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile attributes shown to other users during discovery.
///
/// Created empty at registration and populated by the owner. The photo field
/// is an opaque reference into external image storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl Profile {
    /// An empty profile for a freshly registered user.
    pub fn empty(user_id: UserId, default_photo: &str) -> Self {
        Self {
            user_id,
            first_name: None,
            last_name: None,
            birthday: None,
            gender: None,
            description: None,
            interests: Vec::new(),
            photo: Some(default_photo.to_string()),
        }
    }

    /// Age in whole years on the given date, if a birthday is set.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        use chrono::Datelike;

        let birthday = self.birthday?;
        let mut age = today.year() - birthday.year();
        if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
            age -= 1;
        }
        Some(age)
    }
}

/// A mutual match: one record per unordered pair, stored with the lower
/// id first so the pair is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub user_low: UserId,
    pub user_high: UserId,
    pub matched_at: DateTime<Utc>,
}

impl MatchPair {
    pub fn new(a: UserId, b: UserId, matched_at: DateTime<Utc>) -> Self {
        Self {
            user_low: a.min(b),
            user_high: a.max(b),
            matched_at,
        }
    }

    /// The other endpoint of the pair, if `user` is one of them.
    pub fn peer_of(&self, user: UserId) -> Option<UserId> {
        if user == self.user_low {
            Some(self.user_high)
        } else if user == self.user_high {
            Some(self.user_low)
        } else {
            None
        }
    }

}

/// Canonical (low, high) ordering for an unordered user pair.
pub fn ordered_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// An immutable chat message between two matched users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(rename = "senderId")]
    pub sender_id: UserId,
    #[serde(rename = "receiverId")]
    pub receiver_id: UserId,
    pub body: String,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
}

/// Outcome of a swipe on a candidate profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Like,
    Pass,
}

/// Result of candidate selection. `Exhausted` is a normal terminal state,
/// not an error: the viewer has seen every eligible profile.
#[derive(Debug, Clone)]
pub enum NextCandidate {
    Profile(Profile),
    Exhausted,
}

impl NextCandidate {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, NextCandidate::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pair_is_canonical() {
        let now = Utc::now();
        let forward = MatchPair::new(7, 3, now);
        let reverse = MatchPair::new(3, 7, now);

        assert_eq!(forward.user_low, 3);
        assert_eq!(forward.user_high, 7);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_match_pair_peer_of() {
        let pair = MatchPair::new(1, 2, Utc::now());
        assert_eq!(pair.peer_of(1), Some(2));
        assert_eq!(pair.peer_of(2), Some(1));
        assert_eq!(pair.peer_of(3), None);
    }

    #[test]
    fn test_age_on_before_and_after_birthday() {
        let profile = Profile {
            birthday: NaiveDate::from_ymd_opt(1990, 6, 15),
            ..Profile::empty(1, "unknown_user.png")
        };

        let before = NaiveDate::from_ymd_opt(2020, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();

        assert_eq!(profile.age_on(before), Some(29));
        assert_eq!(profile.age_on(on), Some(30));
    }

    #[test]
    fn test_age_without_birthday() {
        let profile = Profile::empty(1, "unknown_user.png");
        assert_eq!(profile.age_on(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_decision_wire_format() {
        assert_eq!(serde_json::to_string(&Decision::Like).unwrap(), "\"like\"");
        assert_eq!(serde_json::from_str::<Decision>("\"pass\"").unwrap(), Decision::Pass);
    }
}
