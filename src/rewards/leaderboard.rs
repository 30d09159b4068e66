//! Volunteer ranking by reward points.

use crate::model::UserProfile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedVolunteer {
    /// 1-based position.
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub points: u64,
}

/// Ranks volunteers by points, highest first. Ties are broken by display
/// name so the order is stable between refreshes.
pub fn leaderboard(users: &[UserProfile]) -> Vec<RankedVolunteer> {
    let mut sorted: Vec<&UserProfile> = users.iter().collect();
    sorted.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, u)| RankedVolunteer {
            rank: i + 1,
            user_id: u.id.clone(),
            display_name: u.display_name.clone(),
            points: u.points,
        })
        .collect()
}
