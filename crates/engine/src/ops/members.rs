use chrono::Utc;
use serde_json::json;

use crate::{
    EngineError, Member, MemberNew, Outcome, ResultEngine, ids::Counter, store::Collection,
    util::validate_photo,
};

use super::{Console, encode};

impl Console {
    /// Registers a new member.
    ///
    /// - Mints `KV####` from the shared member counter and bumps it.
    /// - `due_amount` is `gym_fees - amount_paid`.
    /// - Invalid input aborts before anything is written.
    pub async fn register_member(&self, payload: MemberNew) -> ResultEngine<Outcome<Member>> {
        let _minting = self.minting.lock().await;
        let sequence = self.state.read().await.member_counter.next();
        let following = Counter::Member.after(sequence)?;

        let member = Member::register(payload, Counter::Member.format(sequence), Utc::now())?;
        let node = encode(&member)?;

        self.write(Collection::Members, &member.id, Some(node)).await;
        self.write(
            Collection::Counters,
            Counter::Member.key(),
            Some(json!(following)),
        )
        .await;

        tracing::info!(id = %member.id, "member registered");
        Ok(Outcome::new(member, "Member registered successfully!"))
    }

    /// Overwrites a member wholesale.
    ///
    /// There is no version check: concurrent edits from two consoles resolve
    /// last-writer-wins in the store. `due_amount` is stored as given.
    pub async fn update_member(&self, member: Member) -> ResultEngine<Outcome<Member>> {
        let member = member.validated()?;
        let node = encode(&member)?;

        self.write(Collection::Members, &member.id, Some(node)).await;

        tracing::info!(id = %member.id, "member updated");
        Ok(Outcome::new(member, "Member updated successfully!"))
    }

    /// Deletes a member and every supplement of theirs known locally.
    ///
    /// Supplements that have not reached this console yet are left behind.
    /// Returns the ids of the deleted supplements.
    pub async fn delete_member(&self, member_id: &str) -> ResultEngine<Outcome<Vec<String>>> {
        let supplement_ids: Vec<String> = self
            .state
            .read()
            .await
            .supplements
            .iter()
            .filter(|supplement| supplement.member_id == member_id)
            .map(|supplement| supplement.id.clone())
            .collect();

        self.write(Collection::Members, member_id, None).await;
        for id in &supplement_ids {
            self.write(Collection::Supplements, id, None).await;
        }

        tracing::info!(
            id = member_id,
            supplements = supplement_ids.len(),
            "member deleted"
        );
        Ok(Outcome::new(
            supplement_ids,
            "Member and associated supplements deleted.",
        ))
    }

    /// Stores a captured photo on an existing member.
    pub async fn attach_photo(&self, member_id: &str, photo: &str) -> ResultEngine<Outcome<Member>> {
        let photo = validate_photo(photo)?;
        let mut member = self
            .state
            .read()
            .await
            .members
            .get(member_id)
            .cloned()
            .ok_or_else(|| EngineError::KeyNotFound(member_id.to_string()))?;
        member.photo = Some(photo);
        self.update_member(member).await
    }
}
