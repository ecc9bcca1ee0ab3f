use crate::error::ScenarioError;
use crate::random::RandomSource;
use crate::user::UserRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// Every user the journey has registered so far, keyed by username.
///
/// Records are stored in a `Vec` so a uniform pick is a single index draw; `index` keeps keys
/// unique. Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct UserRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<UserRecord>,
    index: HashMap<String, usize>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `user`, replacing any record already held under the same username.
    pub fn insert(&self, user: UserRecord) -> Result<(), ScenarioError> {
        let mut inner = self.inner.write()?;
        if let Some(&idx) = inner.index.get(&user.username) {
            inner.users[idx] = user;
        } else {
            let idx = inner.users.len();
            inner.index.insert(user.username.clone(), idx);
            inner.users.push(user);
        }
        Ok(())
    }

    pub fn get(&self, username: &str) -> Result<Option<UserRecord>, ScenarioError> {
        let inner = self.inner.read()?;
        Ok(inner
            .index
            .get(username)
            .map(|&idx| inner.users[idx].clone()))
    }

    pub fn len(&self) -> Result<usize, ScenarioError> {
        Ok(self.inner.read()?.users.len())
    }

    pub fn is_empty(&self) -> Result<bool, ScenarioError> {
        Ok(self.len()? == 0)
    }

    /// One record, uniformly at random.
    pub fn pick(&self, random: &dyn RandomSource) -> Result<UserRecord, ScenarioError> {
        let inner = self.inner.read()?;
        inner.pick(random).cloned().ok_or(ScenarioError::EmptyRegistry)
    }

    /// A `(sender, recipient)` pair with distinct usernames. The recipient is re-drawn until it
    /// differs from the sender.
    pub fn pick_pair(
        &self,
        random: &dyn RandomSource,
    ) -> Result<(UserRecord, UserRecord), ScenarioError> {
        let inner = self.inner.read()?;
        match inner.users.len() {
            0 => return Err(ScenarioError::EmptyRegistry),
            1 => return Err(ScenarioError::NotEnoughUsers(1)),
            _ => {}
        }

        let sender = inner.pick(random).ok_or(ScenarioError::EmptyRegistry)?;
        loop {
            let recipient = inner.pick(random).ok_or(ScenarioError::EmptyRegistry)?;
            if recipient.username != sender.username {
                return Ok((sender.clone(), recipient.clone()));
            }
        }
    }
}

impl Inner {
    fn pick(&self, random: &dyn RandomSource) -> Option<&UserRecord> {
        let last = self.users.len().checked_sub(1)?;
        let idx = random.int_between(0, last as u64) as usize;
        self.users.get(idx)
    }
}
