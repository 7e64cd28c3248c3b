//! Collision group / filter masks
//!
//! One 32-bit interaction value carries two 16-bit sets: bits 0..16 hold the
//! groups a collider belongs to (membership), bits 16..32 hold the groups it
//! may collide with (filter).

use serde::{Deserialize, Serialize};

/// Number of addressable groups
pub const GROUP_COUNT: u32 = 16;

const MEMBERSHIP_BITS: u32 = 0x0000_FFFF;
const FILTER_SHIFT: u32 = 16;

/// Errors raised by group-mask operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("group index {0} is outside 0..{GROUP_COUNT}")]
    OutOfRange(u32),

    #[error("group {0} is not a member of the mask it filters")]
    NotMember(u32),
}

/// Packed membership + filter value understood by the broad phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionMask(pub u32);

impl InteractionMask {
    /// Mask that belongs to no group and filters nothing
    pub const EMPTY: Self = Self(0);

    /// Wrap a raw interaction value
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Pack a membership set and a filter set
    pub const fn from_parts(memberships: u16, filter: u16) -> Self {
        Self(memberships as u32 | ((filter as u32) << FILTER_SHIFT))
    }

    /// Raw 32-bit value
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Groups this mask belongs to
    pub const fn memberships(self) -> u16 {
        (self.0 & MEMBERSHIP_BITS) as u16
    }

    /// Groups this mask may collide with
    pub const fn filter(self) -> u16 {
        (self.0 >> FILTER_SHIFT) as u16
    }

    /// Whether `group` is set in the membership bits
    pub fn has_group(self, group: u32) -> Result<bool, GroupError> {
        Ok(self.0 & group_bit(group)? != 0)
    }

    /// Set the membership bits of every group; nothing changes if any index is invalid
    pub fn add_groups(self, groups: &[u32]) -> Result<Self, GroupError> {
        let bits = group_bits(groups)?;
        Ok(Self(self.0 | bits))
    }

    /// Clear the membership bits of every group; nothing changes if any index is invalid
    pub fn remove_groups(self, groups: &[u32]) -> Result<Self, GroupError> {
        let bits = group_bits(groups)?;
        Ok(Self(self.0 & !bits))
    }

    /// Build the interaction value for this mask's memberships.
    ///
    /// Without `with_groups` the filter accepts every group. Otherwise the
    /// filter is exactly the requested groups, each of which must already be
    /// a member.
    pub fn generate_filter(self, with_groups: Option<&[u32]>) -> Result<Self, GroupError> {
        let memberships = self.0 & MEMBERSHIP_BITS;

        let filter = match with_groups {
            None => MEMBERSHIP_BITS,
            Some(groups) => {
                let bits = group_bits(groups)?;
                if let Some(&outsider) = groups.iter().find(|&&g| memberships & (1 << g) == 0) {
                    return Err(GroupError::NotMember(outsider));
                }
                bits
            }
        };

        Ok(Self(memberships | (filter << FILTER_SHIFT)))
    }

    /// Authored masks with an empty filter collide with every group
    pub const fn with_default_filter(self) -> Self {
        if self.filter() == 0 {
            Self(self.0 | (MEMBERSHIP_BITS << FILTER_SHIFT))
        } else {
            self
        }
    }

    /// Symmetric compatibility: each side's filter must hit the other's memberships
    pub fn test(self, other: Self) -> bool {
        self.filter() & other.memberships() != 0 && other.filter() & self.memberships() != 0
    }
}

impl From<u32> for InteractionMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

fn group_bit(group: u32) -> Result<u32, GroupError> {
    if group >= GROUP_COUNT {
        return Err(GroupError::OutOfRange(group));
    }
    Ok(1 << group)
}

fn group_bits(groups: &[u32]) -> Result<u32, GroupError> {
    groups
        .iter()
        .try_fold(0, |acc, &group| Ok(acc | group_bit(group)?))
}
