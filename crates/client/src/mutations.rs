//! Which cached families each write makes stale.

use std::future::Future;

use tracing::debug;

use crate::{
    cache::{Cache, ResourceFamily},
    error::Result,
};

use ResourceFamily::{Accounts, Budgets, Categories, Dashboard, Goals, Transactions};

/// Every write the client performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutation {
    CreateAccount,
    UpdateAccount,
    ToggleAccount,
    DeleteAccount,
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    ImportTransactions,
    CreateBudget,
    UpdateBudget,
    DeleteBudget,
    ToggleBudget,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateGoal,
    UpdateGoal,
    DeleteGoal,
    ContributeGoal,
    WithdrawGoal,
}

impl Mutation {
    pub fn invalidates(self) -> &'static [ResourceFamily] {
        match self {
            Self::CreateAccount | Self::UpdateAccount | Self::ToggleAccount => {
                &[Accounts, Dashboard]
            }
            Self::DeleteAccount => &[Accounts, Dashboard, Transactions],
            Self::CreateTransaction | Self::UpdateTransaction | Self::DeleteTransaction => {
                &[Transactions, Accounts, Dashboard, Budgets]
            }
            Self::ImportTransactions => &[Transactions, Accounts, Dashboard],
            Self::CreateBudget | Self::UpdateBudget | Self::DeleteBudget | Self::ToggleBudget => {
                &[Budgets, Dashboard]
            }
            Self::CreateCategory | Self::UpdateCategory | Self::DeleteCategory => {
                &[Categories, Transactions, Budgets]
            }
            Self::CreateGoal
            | Self::UpdateGoal
            | Self::DeleteGoal
            | Self::ContributeGoal
            | Self::WithdrawGoal => &[Goals, Dashboard],
        }
    }
}

/// Runs writes and invalidates the families they touch once they succeed.
#[derive(Clone, Debug)]
pub struct MutationCoordinator {
    cache: Cache,
}

impl MutationCoordinator {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Marks every family touched by `mutation` stale. Refetching happens on
    /// the next read.
    pub fn apply(&self, mutation: Mutation) {
        debug!("{mutation:?} succeeded, invalidating {:?}", mutation.invalidates());
        for family in mutation.invalidates() {
            self.cache.invalidate_family(*family);
        }
    }

    /// Awaits `request` and invalidates only if it succeeded.
    pub async fn run<T, Fut>(&self, mutation: Mutation, request: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let result = request.await;
        if result.is_ok() {
            self.apply(mutation);
        }
        result
    }
}
