use shared::{
    domain::{PayoutStatus, Role, TaskStatus, UserId, UserStatus},
    protocol::{MeetingRecord, PayoutRecord, TaskRecord, UserProfile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskSummary {
    pub not_started: usize,
    pub editing: usize,
    pub cant_do: usize,
    pub done: usize,
    pub total: usize,
}

pub fn summarize_tasks<'a>(tasks: impl IntoIterator<Item = &'a TaskRecord>) -> TaskSummary {
    let mut summary = TaskSummary::default();
    for task in tasks {
        summary.total += 1;
        match task.status {
            TaskStatus::NotStarted => summary.not_started += 1,
            TaskStatus::Editing => summary.editing += 1,
            TaskStatus::CantDo => summary.cant_do += 1,
            TaskStatus::Done => summary.done += 1,
        }
    }
    summary
}

/// Summary over only the tasks assigned to `user`.
pub fn summarize_tasks_for(tasks: &[TaskRecord], user: UserId) -> TaskSummary {
    summarize_tasks(
        tasks
            .iter()
            .filter(|task| task.assignee_id == Some(user)),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayoutSummary {
    pub pending: usize,
    pub completed: usize,
    pub pending_cents: i64,
    pub completed_cents: i64,
}

pub fn summarize_payouts(payouts: &[PayoutRecord]) -> PayoutSummary {
    let mut summary = PayoutSummary::default();
    for payout in payouts {
        match payout.status {
            PayoutStatus::Pending => {
                summary.pending += 1;
                summary.pending_cents += payout.amount_cents;
            }
            PayoutStatus::Done => {
                summary.completed += 1;
                summary.completed_cents += payout.amount_cents;
            }
        }
    }
    summary
}

/// The roster a manager assigns work from.
pub fn approved_editors(users: &[UserProfile]) -> Vec<&UserProfile> {
    users
        .iter()
        .filter(|user| user.role == Role::Editor && user.status == UserStatus::Approved)
        .collect()
}

/// One fetch of everything the home screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub tasks: Vec<TaskRecord>,
    pub meetings: Vec<MeetingRecord>,
    pub payouts: Vec<PayoutRecord>,
}

impl DashboardSnapshot {
    pub fn task_summary(&self) -> TaskSummary {
        summarize_tasks(&self.tasks)
    }

    pub fn payout_summary(&self) -> PayoutSummary {
        summarize_payouts(&self.payouts)
    }
}

#[cfg(test)]
#[path = "tests/records_tests.rs"]
mod tests;
