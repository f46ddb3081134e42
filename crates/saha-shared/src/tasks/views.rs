use crate::models::{Task, Viewer};

/// One viewer's partition of the task collection. Recomputed from scratch
/// whenever the collection changes.
///
/// `sent`, `received` and `personal` are pairwise disjoint. Tasks with no
/// addressee appear in none of them.
#[derive(Debug, Clone, Default)]
pub struct TaskViews {
    pub sent: Vec<Task>,
    pub received: Vec<Task>,
    pub personal: Vec<Task>,
}

impl TaskViews {
    pub fn for_viewer(tasks: &[Task], viewer: &Viewer) -> Self {
        let mut views = Self::default();

        for task in tasks.iter().filter(|t| t.is_addressed()) {
            let from_viewer = task.assigned_by == viewer.uid;
            let to_viewer = task.is_assigned_to(viewer);

            if from_viewer && to_viewer {
                views.personal.push(task.clone());
            } else if from_viewer {
                views.sent.push(task.clone());
            } else if to_viewer || task.is_for_unit_of(viewer) {
                views.received.push(task.clone());
            }
        }

        for list in [&mut views.sent, &mut views.received, &mut views.personal] {
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        views
    }

    /// What the viewer has to act on: received tasks and personal notes.
    pub fn inbox(&self) -> Vec<Task> {
        let mut inbox: Vec<Task> = self
            .received
            .iter()
            .chain(self.personal.iter())
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        inbox
    }

    /// Unread pending tasks from others. Personal notes never count.
    pub fn unread_count(&self) -> usize {
        self.received.iter().filter(|t| t.is_unread()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TaskStatus};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn viewer(unit: Option<&str>) -> Viewer {
        Viewer {
            uid: Uuid::new_v4(),
            display_name: "V".into(),
            role: Role::Koordinator,
            unit: unit.map(str::to_string),
        }
    }

    fn task(by: Uuid, to: Option<Uuid>, unit: Option<&str>, minute: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            assigned_to_user_id: to,
            assigned_to_unit: unit.map(str::to_string),
            assigned_by: by,
            sender_name: "S".into(),
            sender_role: Role::Sorumlu,
            status: TaskStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minute),
            read_at: None,
            completion_note: None,
            completed_at: None,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<Uuid> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn partitions_stay_disjoint_over_generated_sets() {
        let me = viewer(Some("Ankara"));
        let other = Uuid::new_v4();
        let senders = [me.uid, other];
        let targets = [Some(me.uid), Some(other), None];
        let units = [Some("Ankara"), Some("İzmir"), None];

        let mut all = Vec::new();
        let mut minute = 0;
        for by in senders {
            for to in targets {
                for unit in units {
                    all.push(task(by, to, unit, minute));
                    minute += 1;
                }
            }
        }

        // Every prefix of the generated set, so partitions are checked on
        // many collection shapes.
        for n in 0..=all.len() {
            let views = TaskViews::for_viewer(&all[..n], &me);
            let sent: HashSet<_> = ids(&views.sent).into_iter().collect();
            let received: HashSet<_> = ids(&views.received).into_iter().collect();
            let personal: HashSet<_> = ids(&views.personal).into_iter().collect();

            assert!(sent.is_disjoint(&received));
            assert!(sent.is_disjoint(&personal));
            assert!(received.is_disjoint(&personal));

            for t in &all[..n] {
                if !t.is_addressed() {
                    assert!(
                        !sent.contains(&t.id)
                            && !received.contains(&t.id)
                            && !personal.contains(&t.id)
                    );
                }
            }
        }
    }

    #[test]
    fn unit_tasks_reach_unit_members_only() {
        let me = viewer(Some("Ankara"));
        let sender = Uuid::new_v4();
        let ankara = task(sender, None, Some("Ankara"), 1);
        let izmir = task(sender, None, Some("İzmir"), 2);

        let views = TaskViews::for_viewer(&[ankara.clone(), izmir], &me);
        assert_eq!(ids(&views.received), vec![ankara.id]);

        let unitless = TaskViews::for_viewer(&[ankara], &viewer(None));
        assert!(unitless.received.is_empty());
    }

    #[test]
    fn lists_are_newest_first_and_inbox_merges_personal() {
        let me = viewer(None);
        let sender = Uuid::new_v4();
        let old = task(sender, Some(me.uid), None, 1);
        let note = task(me.uid, Some(me.uid), None, 2);
        let new = task(sender, Some(me.uid), None, 3);

        let views = TaskViews::for_viewer(&[old.clone(), note.clone(), new.clone()], &me);
        assert_eq!(ids(&views.received), vec![new.id, old.id]);
        assert_eq!(ids(&views.personal), vec![note.id]);
        assert_eq!(ids(&views.inbox()), vec![new.id, note.id, old.id]);
    }

    #[test]
    fn unread_count_ignores_read_completed_and_personal() {
        let me = viewer(None);
        let sender = Uuid::new_v4();
        let unread = task(sender, Some(me.uid), None, 1);
        let mut read = task(sender, Some(me.uid), None, 2);
        read.read_at = Some(Utc::now());
        let mut done = task(sender, Some(me.uid), None, 3);
        done.status = TaskStatus::Completed;
        let note = task(me.uid, Some(me.uid), None, 4);

        let views = TaskViews::for_viewer(&[unread, read, done, note], &me);
        assert_eq!(views.unread_count(), 1);
    }
}
