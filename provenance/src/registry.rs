//! Member registry.
//!
//! Members are written once and never updated.

use tracing::{debug, info};

use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::{require_non_empty, LedgerError};
use crate::types::{Member, MemberType};

/// Positional arguments of `addMember`.
#[derive(Debug, Clone)]
pub struct MemberInput {
    pub id: String,
    pub organization: String,
    pub address: String,
    pub member_type: String,
}

impl MemberInput {
    pub fn new(
        id: impl Into<String>,
        organization: impl Into<String>,
        address: impl Into<String>,
        member_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            organization: organization.into(),
            address: address.into(),
            member_type: member_type.into(),
        }
    }
}

pub struct MemberRegistry<'a> {
    config: &'a ContractConfig,
}

impl<'a> MemberRegistry<'a> {
    pub fn new(config: &'a ContractConfig) -> Self {
        Self { config }
    }

    /// Register a participant under its id.
    ///
    /// With `reject_duplicate_members` off, only an existing member may be
    /// replaced; any other record under the key fails to decode.
    pub async fn add_member(
        &self,
        ctx: &mut TxContext,
        input: &MemberInput,
    ) -> Result<Member, LedgerError> {
        require_non_empty("id", &input.id)?;
        let member_type: MemberType = input.member_type.parse()?;

        let key = self.config.key_layout.member_key(&input.id);
        if self.config.reject_duplicate_members {
            if ctx.exists(&key).await? {
                return Err(LedgerError::AlreadyExists { key });
            }
        } else {
            ctx.find_record::<Member>(&key).await?;
        }

        let member = Member {
            id: input.id.clone(),
            organization: input.organization.clone(),
            address: input.address.clone(),
            member_type,
        };
        ctx.put_record(&key, &member)?;

        info!(member_id = %member.id, member_type = %member.member_type, "Member registered");
        Ok(member)
    }

    /// Load a member and check its role.
    ///
    /// Only consulted when `verify_participants` is enabled.
    pub async fn require_member(
        &self,
        ctx: &mut TxContext,
        field: &str,
        id: &str,
        expected: MemberType,
    ) -> Result<(), LedgerError> {
        if !self.config.verify_participants {
            return Ok(());
        }

        let key = self.config.key_layout.member_key(id);
        let member: Member = ctx.get_record(&key).await?;
        if member.member_type != expected {
            return Err(LedgerError::validation(
                field,
                format!("member {id} is a {}, expected {expected}", member.member_type),
            ));
        }

        debug!(member_id = %id, role = %expected, "Participant verified");
        Ok(())
    }
}
