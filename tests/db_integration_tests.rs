//! Integration tests for the database layer.
//!
//! These tests verify the core database operations using an in-memory SQLite database.
//! Tests are organized by module and functionality.

use std::thread::sleep;
use std::time::Duration;
use wise_tasks::db::Database;
use wise_tasks::error::{ApiError, ErrorCode};
use wise_tasks::types::{
    CategoryInput, CompanyUpdate, Employee, EmployeeUpdate, NewCompany, NewEmployee, NewTask,
    Priority, Role, TaskFilter, TaskScope, TaskStatus, TaskUpdate,
};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

/// Extract the API error code from a database error.
fn code_of(err: anyhow::Error) -> ErrorCode {
    ApiError::from(err).code
}

fn employee(db: &Database, username: &str, name_ar: &str, role: Role) -> Employee {
    db.create_employee(
        &NewEmployee {
            username: username.into(),
            password: "unused".into(),
            full_name_ar: name_ar.into(),
            full_name_en: None,
            role,
        },
        "$argon2id$placeholder",
    )
    .expect("Failed to create employee")
}

/// A company, a category and two employees to hang tasks on.
struct Fixture {
    db: Database,
    company_id: String,
    category_id: String,
    admin: Employee,
    sara: Employee,
    omar: Employee,
}

fn fixture() -> Fixture {
    let db = setup_db();
    let company = db
        .create_company(&NewCompany {
            name_ar: "شركة النور".into(),
            name_en: Some("Al Noor Co".into()),
            ..Default::default()
        })
        .unwrap();
    let category = db
        .create_category(&CategoryInput {
            classification: "ضرائب".into(),
            task_type: "إقرار ضريبة القيمة المضافة".into(),
        })
        .unwrap();
    let admin = employee(&db, "admin", "المدير", Role::Admin);
    let sara = employee(&db, "sara", "سارة", Role::Employee);
    let omar = employee(&db, "omar", "عمر", Role::Employee);
    Fixture {
        db,
        company_id: company.id,
        category_id: category.id,
        admin,
        sara,
        omar,
    }
}

impl Fixture {
    fn task(&self, assignee: Option<&Employee>, priority: Priority) -> String {
        self.db
            .create_task(
                &NewTask {
                    company_id: self.company_id.clone(),
                    category_id: self.category_id.clone(),
                    priority: Some(priority),
                    assigned_to: assignee.map(|e| e.id.clone()),
                    ..Default::default()
                },
                Some(&self.admin.id),
            )
            .unwrap()
            .task
            .id
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn new_task_starts_open_without_dates() {
        let f = fixture();
        let id = f.task(Some(&f.sara), Priority::High);

        let view = f.db.get_task(&id).unwrap().unwrap();
        assert_eq!(view.task.status, TaskStatus::Open);
        assert!(view.task.start_date.is_none());
        assert!(view.task.end_date.is_none());
        assert_eq!(view.task.created_by.as_deref(), Some(f.admin.id.as_str()));
        assert_eq!(
            view.next_statuses,
            vec![TaskStatus::InProgress, TaskStatus::Done]
        );
        assert_eq!(view.company.unwrap().name_ar, "شركة النور");
        assert_eq!(view.assignee.unwrap().username, "sara");
    }

    #[test]
    fn create_defaults_priority_to_medium() {
        let f = fixture();
        let view = f
            .db
            .create_task(
                &NewTask {
                    company_id: f.company_id.clone(),
                    category_id: f.category_id.clone(),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(view.task.priority, Priority::Medium);
    }

    #[test]
    fn full_lifecycle_stamps_dates_and_history() {
        let f = fixture();
        let id = f.task(Some(&f.sara), Priority::Medium);

        let started = f
            .db
            .transition_task(&id, TaskStatus::InProgress, &TaskScope::All, Some(&f.sara.id))
            .unwrap();
        let start_date = started.task.start_date.expect("start date set");
        assert!(started.task.end_date.is_none());
        assert_eq!(started.next_statuses, vec![TaskStatus::Done]);

        sleep(Duration::from_millis(2));
        let done = f
            .db
            .transition_task(&id, TaskStatus::Done, &TaskScope::All, Some(&f.sara.id))
            .unwrap();
        assert_eq!(done.task.status, TaskStatus::Done);
        assert!(done.next_statuses.is_empty());
        assert_eq!(done.task.start_date, Some(start_date));
        assert!(done.task.end_date.unwrap() >= start_date);

        let history = f.db.get_task_history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_status, TaskStatus::Open);
        assert_eq!(history[0].new_status, TaskStatus::InProgress);
        assert_eq!(history[1].old_status, TaskStatus::InProgress);
        assert_eq!(history[1].new_status, TaskStatus::Done);
        assert!(
            history
                .iter()
                .all(|h| h.changed_by.as_deref() == Some(f.sara.id.as_str()))
        );
    }

    #[test]
    fn open_to_done_sets_only_end_date() {
        let f = fixture();
        let id = f.task(None, Priority::Low);

        let done = f.db.transition_task(&id, TaskStatus::Done, &TaskScope::All, None).unwrap();
        assert!(done.task.start_date.is_none());
        assert!(done.task.end_date.is_some());
        assert_eq!(f.db.get_task_history(&id).unwrap().len(), 1);
    }

    #[test]
    fn invalid_transitions_leave_task_untouched() {
        let f = fixture();
        let id = f.task(None, Priority::Low);

        let err = f.db.transition_task(&id, TaskStatus::Open, &TaskScope::All, None).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidTransition);

        f.db.transition_task(&id, TaskStatus::Done, &TaskScope::All, None).unwrap();
        let before = f.db.get_task(&id).unwrap().unwrap();

        for to in [TaskStatus::Open, TaskStatus::InProgress, TaskStatus::Done] {
            let err = f.db.transition_task(&id, to, &TaskScope::All, None).unwrap_err();
            assert_eq!(code_of(err), ErrorCode::InvalidTransition);
        }

        let after = f.db.get_task(&id).unwrap().unwrap();
        assert_eq!(after.task.status, TaskStatus::Done);
        assert_eq!(after.task.end_date, before.task.end_date);
        assert_eq!(f.db.get_task_history(&id).unwrap().len(), 1);
    }

    #[test]
    fn transition_unknown_task_is_not_found() {
        let db = setup_db();
        let err = db
            .transition_task("missing", TaskStatus::Done, &TaskScope::All, None)
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);
    }

    #[test]
    fn update_with_status_goes_through_lifecycle() {
        let f = fixture();
        let id = f.task(None, Priority::Low);

        let view = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    notes: Some(Some("بدأ العمل".into())),
                    ..Default::default()
                },
                Some(&f.admin.id),
            )
            .unwrap();
        assert_eq!(view.task.status, TaskStatus::InProgress);
        assert!(view.task.start_date.is_some());
        assert_eq!(view.task.notes.as_deref(), Some("بدأ العمل"));
        assert_eq!(f.db.get_task_history(&id).unwrap().len(), 1);
    }

    #[test]
    fn rejected_status_in_update_rolls_back_other_fields() {
        let f = fixture();
        let id = f.task(None, Priority::Low);
        f.db.transition_task(&id, TaskStatus::Done, &TaskScope::All, None).unwrap();

        let err = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    status: Some(TaskStatus::Open),
                    priority: Some(Priority::Critical),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::InvalidTransition);

        let view = f.db.get_task(&id).unwrap().unwrap();
        assert_eq!(view.task.priority, Priority::Low);
        assert_eq!(view.task.status, TaskStatus::Done);
    }

    #[test]
    fn same_status_in_update_is_ignored() {
        let f = fixture();
        let id = f.task(None, Priority::Low);

        let view = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    status: Some(TaskStatus::Open),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(view.task.status, TaskStatus::Open);
        assert!(f.db.get_task_history(&id).unwrap().is_empty());
    }

    #[test]
    fn transition_outside_scope_is_forbidden() {
        let f = fixture();
        let id = f.task(Some(&f.sara), Priority::Medium);
        let sara_scope = TaskScope::AssignedTo(f.sara.id.clone());

        // Reassigned away from Sara before she moves it.
        f.db.update_task(
            &id,
            &TaskUpdate {
                assigned_to: Some(Some(f.omar.id.clone())),
                ..Default::default()
            },
            Some(&f.admin.id),
        )
        .unwrap();

        let err = f
            .db
            .transition_task(&id, TaskStatus::InProgress, &sara_scope, Some(&f.sara.id))
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::Forbidden);

        let view = f.db.get_task(&id).unwrap().unwrap();
        assert_eq!(view.task.status, TaskStatus::Open);
        assert!(f.db.get_task_history(&id).unwrap().is_empty());

        let omar_scope = TaskScope::AssignedTo(f.omar.id.clone());
        let view = f
            .db
            .transition_task(&id, TaskStatus::InProgress, &omar_scope, Some(&f.omar.id))
            .unwrap();
        assert_eq!(view.task.status, TaskStatus::InProgress);
    }

    #[test]
    fn task_of_deactivated_employee_stays_editable() {
        let f = fixture();
        let id = f.task(Some(&f.sara), Priority::Low);
        f.db.deactivate_employee(&f.sara.id).unwrap();

        // Full-form edit resending the unchanged assignee.
        let view = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    company_id: Some(f.company_id.clone()),
                    category_id: Some(f.category_id.clone()),
                    assigned_to: Some(Some(f.sara.id.clone())),
                    notes: Some(Some("تمت المراجعة".into())),
                    ..Default::default()
                },
                Some(&f.admin.id),
            )
            .unwrap();
        assert_eq!(view.task.assigned_to.as_deref(), Some(f.sara.id.as_str()));
        assert_eq!(view.task.notes.as_deref(), Some("تمت المراجعة"));

        // Assigning a different inactive employee is still refused.
        let err = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    reviewed_by: Some(Some(f.sara.id.clone())),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);
    }

    #[test]
    fn delete_removes_task_and_history() {
        let f = fixture();
        let id = f.task(None, Priority::Low);
        f.db.transition_task(&id, TaskStatus::Done, &TaskScope::All, None).unwrap();

        f.db.delete_task(&id).unwrap();
        assert!(f.db.get_task(&id).unwrap().is_none());
        assert!(f.db.get_task_history(&id).unwrap().is_empty());

        let err = f.db.delete_task(&id).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);
    }
}

mod task_query_tests {
    use super::*;

    #[test]
    fn employee_scope_sees_only_own_tasks() {
        let f = fixture();
        f.task(Some(&f.sara), Priority::High);
        f.task(Some(&f.sara), Priority::Low);
        f.task(Some(&f.omar), Priority::Low);
        f.task(None, Priority::Critical);

        let all = f
            .db
            .list_tasks(&TaskFilter::default(), &TaskScope::All)
            .unwrap();
        assert_eq!(all.len(), 4);

        let scope = TaskScope::AssignedTo(f.sara.id.clone());
        let mine = f.db.list_tasks(&TaskFilter::default(), &scope).unwrap();
        let expected: Vec<_> = all
            .iter()
            .filter(|v| v.task.assigned_to.as_deref() == Some(f.sara.id.as_str()))
            .map(|v| v.task.id.clone())
            .collect();
        let actual: Vec<_> = mine.iter().map(|v| v.task.id.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn list_is_newest_first() {
        let f = fixture();
        let first = f.task(None, Priority::Low);
        sleep(Duration::from_millis(2));
        let second = f.task(None, Priority::Low);

        let all = f
            .db
            .list_tasks(&TaskFilter::default(), &TaskScope::All)
            .unwrap();
        assert_eq!(all[0].task.id, second);
        assert_eq!(all[1].task.id, first);
    }

    #[test]
    fn my_tasks_orders_by_priority_rank() {
        let f = fixture();
        let low = f.task(Some(&f.sara), Priority::Low);
        let critical = f.task(Some(&f.sara), Priority::Critical);
        let medium = f.task(Some(&f.sara), Priority::Medium);
        f.task(Some(&f.omar), Priority::Critical);

        let ids: Vec<_> = f
            .db
            .my_tasks(&f.sara.id)
            .unwrap()
            .into_iter()
            .map(|v| v.task.id)
            .collect();
        assert_eq!(ids, vec![critical, medium, low]);
    }

    #[test]
    fn filters_by_status_priority_and_search() {
        let f = fixture();
        let other_company = f
            .db
            .create_company(&NewCompany {
                name_ar: "مؤسسة الأمل".into(),
                ..Default::default()
            })
            .unwrap();
        let hopeful = f
            .db
            .create_task(
                &NewTask {
                    company_id: other_company.id.clone(),
                    category_id: f.category_id.clone(),
                    description: Some("Quarterly 50% REVIEW".into()),
                    priority: Some(Priority::Critical),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let plain = f.task(None, Priority::Low);
        f.db.transition_task(&plain, TaskStatus::InProgress, &TaskScope::All, None)
            .unwrap();

        let by_company = f
            .db
            .list_tasks(
                &TaskFilter {
                    search: Some("الأمل".into()),
                    ..Default::default()
                },
                &TaskScope::All,
            )
            .unwrap();
        assert_eq!(by_company.len(), 1);
        assert_eq!(by_company[0].task.id, hopeful.task.id);

        let by_description = f
            .db
            .list_tasks(
                &TaskFilter {
                    search: Some("review".into()),
                    ..Default::default()
                },
                &TaskScope::All,
            )
            .unwrap();
        assert_eq!(by_description.len(), 1);

        // LIKE wildcards in the term match literally.
        let percent = f
            .db
            .list_tasks(
                &TaskFilter {
                    search: Some("50%".into()),
                    ..Default::default()
                },
                &TaskScope::All,
            )
            .unwrap();
        assert_eq!(percent.len(), 1);

        let in_progress = f
            .db
            .list_tasks(
                &TaskFilter {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
                &TaskScope::All,
            )
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].task.id, plain);

        let critical = f
            .db
            .list_tasks(
                &TaskFilter {
                    priority: Some(Priority::Critical),
                    ..Default::default()
                },
                &TaskScope::All,
            )
            .unwrap();
        assert_eq!(critical.len(), 1);
    }

    #[test]
    fn create_rejects_unknown_references() {
        let f = fixture();
        let err = f
            .db
            .create_task(
                &NewTask {
                    company_id: "nope".into(),
                    category_id: f.category_id.clone(),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);

        let err = f
            .db
            .create_task(
                &NewTask {
                    company_id: f.company_id.clone(),
                    category_id: f.category_id.clone(),
                    assigned_to: Some("ghost".into()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);

        let err = f
            .db
            .create_task(&NewTask::default(), None)
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn update_can_clear_assignee() {
        let f = fixture();
        let id = f.task(Some(&f.sara), Priority::Low);

        let view = f
            .db
            .update_task(
                &id,
                &TaskUpdate {
                    assigned_to: Some(None),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert!(view.task.assigned_to.is_none());
        assert!(view.assignee.is_none());
    }

    #[test]
    fn task_view_keeps_deactivated_company_name() {
        let f = fixture();
        let id = f.task(None, Priority::Low);
        f.db.deactivate_company(&f.company_id).unwrap();

        let view = f.db.get_task(&id).unwrap().unwrap();
        assert_eq!(view.company.unwrap().name_ar, "شركة النور");
        assert!(f.db.list_companies(None).unwrap().is_empty());
    }
}

mod stats_tests {
    use super::*;

    #[test]
    fn pending_is_total_minus_done_per_scope() {
        let f = fixture();
        let a = f.task(Some(&f.sara), Priority::Critical);
        let b = f.task(Some(&f.sara), Priority::High);
        f.task(Some(&f.omar), Priority::High);
        f.task(None, Priority::Low);

        f.db.transition_task(&a, TaskStatus::Done, &TaskScope::All, None).unwrap();
        f.db.transition_task(&b, TaskStatus::InProgress, &TaskScope::All, None)
            .unwrap();

        let all = f.db.task_stats(&TaskScope::All).unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.done, 1);
        assert_eq!(all.in_progress, 1);
        assert_eq!(all.open, 2);
        assert_eq!(all.pending, all.total - all.done);
        // Done tasks do not count as urgent.
        assert_eq!(all.critical, 0);
        assert_eq!(all.high, 2);

        let sara = f
            .db
            .task_stats(&TaskScope::AssignedTo(f.sara.id.clone()))
            .unwrap();
        assert_eq!(sara.total, 2);
        assert_eq!(sara.pending, 1);
        assert_eq!(sara.high, 1);
    }

    #[test]
    fn recent_tasks_are_limited_and_scoped() {
        let f = fixture();
        for _ in 0..7 {
            f.task(Some(&f.sara), Priority::Low);
        }
        f.task(Some(&f.omar), Priority::Low);

        assert_eq!(f.db.recent_tasks(&TaskScope::All, 5).unwrap().len(), 5);
        let omar = f
            .db
            .recent_tasks(&TaskScope::AssignedTo(f.omar.id.clone()), 5)
            .unwrap();
        assert_eq!(omar.len(), 1);
    }

    #[test]
    fn empty_database_has_zero_stats() {
        let db = setup_db();
        let stats = db.task_stats(&TaskScope::All).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pending, 0);
    }
}

mod employee_tests {
    use super::*;

    #[test]
    fn usernames_are_unique() {
        let db = setup_db();
        employee(&db, "sara", "سارة", Role::Employee);
        let err = db
            .create_employee(
                &NewEmployee {
                    username: "sara".into(),
                    password: "x".into(),
                    full_name_ar: "سارة أخرى".into(),
                    ..Default::default()
                },
                "hash",
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::AlreadyExists);
    }

    #[test]
    fn list_is_active_only_and_searchable() {
        let db = setup_db();
        let sara = employee(&db, "sara", "سارة", Role::Employee);
        employee(&db, "omar", "عمر", Role::Employee);

        assert_eq!(db.list_employees(Some("OMA")).unwrap().len(), 1);

        db.deactivate_employee(&sara.id).unwrap();
        let listed = db.list_employees(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "omar");
        // Still resolvable by id.
        assert!(!db.get_employee(&sara.id).unwrap().unwrap().is_active);
        assert!(db.find_active_employee_by_username("sara").unwrap().is_none());
    }

    #[test]
    fn update_without_password_keeps_hash() {
        let db = setup_db();
        let sara = employee(&db, "sara", "سارة", Role::Employee);

        let updated = db
            .update_employee(
                &sara.id,
                &EmployeeUpdate {
                    full_name_en: Some(Some("Sara".into())),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(updated.full_name_en.as_deref(), Some("Sara"));
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.password_hash, sara.password_hash);
        assert_eq!(db.count_active_admins().unwrap(), 1);
    }

    #[test]
    fn deactivation_ends_sessions() {
        let db = setup_db();
        let sara = employee(&db, "sara", "سارة", Role::Employee);
        let session = db.create_session(&sara.id, 60_000).unwrap();

        db.deactivate_employee(&sara.id).unwrap();
        assert!(db.get_active_session(&session.id).unwrap().is_none());

        let err = db.deactivate_employee(&sara.id).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::NotFound);
    }
}

mod company_tests {
    use super::*;

    #[test]
    fn create_requires_arabic_name() {
        let db = setup_db();
        let err = db
            .create_company(&NewCompany {
                name_ar: "  ".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn partial_update_and_clear() {
        let db = setup_db();
        let company = db
            .create_company(&NewCompany {
                name_ar: "شركة".into(),
                sector: Some("تجارة".into()),
                ..Default::default()
            })
            .unwrap();

        let updated = db
            .update_company(
                &company.id,
                &CompanyUpdate {
                    name_en: Some(Some("Company".into())),
                    sector: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name_ar, "شركة");
        assert_eq!(updated.name_en.as_deref(), Some("Company"));
        assert!(updated.sector.is_none());
    }

    #[test]
    fn list_orders_by_arabic_name() {
        let db = setup_db();
        for name in ["ب", "أ", "ت"] {
            db.create_company(&NewCompany {
                name_ar: name.into(),
                ..Default::default()
            })
            .unwrap();
        }
        let names: Vec<_> = db
            .list_companies(None)
            .unwrap()
            .into_iter()
            .map(|c| c.name_ar)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}

mod category_tests {
    use super::*;

    #[test]
    fn grouped_by_classification() {
        let db = setup_db();
        for (classification, task_type) in [
            ("ضرائب", "إقرار شهري"),
            ("تدقيق", "مراجعة سنوية"),
            ("ضرائب", "إقرار سنوي"),
        ] {
            db.create_category(&CategoryInput {
                classification: classification.into(),
                task_type: task_type.into(),
            })
            .unwrap();
        }

        let groups = db.grouped_categories().unwrap();
        assert_eq!(groups.len(), 2);
        let taxes = groups
            .iter()
            .find(|g| g.classification == "ضرائب")
            .unwrap();
        assert_eq!(taxes.categories.len(), 2);
    }

    #[test]
    fn category_in_use_cannot_be_deleted() {
        let f = fixture();
        let id = f.task(None, Priority::Low);

        let err = f.db.delete_category(&f.category_id).unwrap_err();
        assert_eq!(code_of(err), ErrorCode::Conflict);

        f.db.delete_task(&id).unwrap();
        f.db.delete_category(&f.category_id).unwrap();
        assert!(f.db.get_category(&f.category_id).unwrap().is_none());
    }

    #[test]
    fn update_requires_both_fields() {
        let db = setup_db();
        let category = db
            .create_category(&CategoryInput {
                classification: "ضرائب".into(),
                task_type: "إقرار".into(),
            })
            .unwrap();
        let err = db
            .update_category(
                &category.id,
                &CategoryInput {
                    classification: "".into(),
                    task_type: "x".into(),
                },
            )
            .unwrap_err();
        assert_eq!(code_of(err), ErrorCode::MissingRequiredField);
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn expired_sessions_are_inactive_and_purged() {
        let db = setup_db();
        let sara = employee(&db, "sara", "سارة", Role::Employee);

        let live = db.create_session(&sara.id, 60_000).unwrap();
        let expired = db.create_session(&sara.id, -1_000).unwrap();

        assert!(db.get_active_session(&live.id).unwrap().is_some());
        assert!(db.get_active_session(&expired.id).unwrap().is_none());

        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.delete_session(&live.id).unwrap());
        assert!(!db.delete_session(&live.id).unwrap());
    }

    #[test]
    fn delete_all_sessions_for_employee() {
        let db = setup_db();
        let sara = employee(&db, "sara", "سارة", Role::Employee);
        db.create_session(&sara.id, 60_000).unwrap();
        db.create_session(&sara.id, 60_000).unwrap();

        assert_eq!(db.delete_sessions_for_employee(&sara.id).unwrap(), 2);
    }
}
