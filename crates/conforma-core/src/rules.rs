//! # Business Rules
//!
//! Date consistency, status side effects and degradation rules shared by the
//! repositories. Everything here is pure: "today" is always passed in.

use crate::primitives::{WHY_COUNT, is_filled};
use crate::{
    ConformaError, MonitoringStatus, Priority, ProjectStatus, Result, TaskStatus,
};
use chrono::{Datelike, NaiveDate};

// =============================================================================
// DATE RANGES
// =============================================================================

/// Reject an end date earlier than its start date.
///
/// `context` names the record in the error message ("projeto", "tarefa").
pub fn check_date_order(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    context: &str,
) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(ConformaError::Validation(format!(
            "A data final de {} nao pode ser anterior a data inicial.",
            context
        )));
    }
    Ok(())
}

// =============================================================================
// PROJECT DATES
// =============================================================================

/// The schedule-relevant state of a project after merging an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectSchedule {
    pub status: ProjectStatus,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub data_fim_real: Option<NaiveDate>,
}

/// Validate a merged project schedule and apply status side effects.
///
/// - neither end date may precede the start date
/// - finishing before the planned end is accepted only for concluded projects
/// - concluding without an actual end date stamps `today`, or the start date
///   when the project starts later
/// - an explicit status change away from `concluido` clears the actual end
///   date unless the same change sets it
///
/// The dates are checked as merged; the stamp is applied afterwards.
pub fn settle_project_schedule(
    schedule: &mut ProjectSchedule,
    status_changed: bool,
    end_date_given: bool,
    today: NaiveDate,
) -> Result<()> {
    check_date_order(schedule.data_inicio, schedule.data_fim_prevista, "projeto")?;
    check_date_order(schedule.data_inicio, schedule.data_fim_real, "projeto")?;

    if let (Some(planned), Some(actual)) = (schedule.data_fim_prevista, schedule.data_fim_real)
        && actual < planned
        && schedule.status != ProjectStatus::Concluido
    {
        return Err(ConformaError::Validation(
            "Data final real anterior ao prazo previsto so e aceita para projetos concluidos."
                .to_string(),
        ));
    }

    if schedule.status == ProjectStatus::Concluido {
        if schedule.data_fim_real.is_none() {
            schedule.data_fim_real = Some(completion_stamp(schedule.data_inicio, today));
        }
    } else if status_changed && !end_date_given {
        schedule.data_fim_real = None;
    }
    Ok(())
}

/// A project is overdue when its planned end passed and it is still active.
#[must_use]
pub fn project_is_overdue(
    status: ProjectStatus,
    data_fim_prevista: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    data_fim_prevista.is_some_and(|d| d < today) && !status.is_closed()
}

// =============================================================================
// TASK DATES
// =============================================================================

/// The schedule-relevant state of a task after merging an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSchedule {
    pub status: TaskStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<NaiveDate>,
}

/// Validate a merged task schedule and apply status side effects.
///
/// Mirrors [`settle_project_schedule`] with `concluida` as the final status.
pub fn settle_task_schedule(
    schedule: &mut TaskSchedule,
    status_changed: bool,
    completion_given: bool,
    today: NaiveDate,
) -> Result<()> {
    check_date_order(schedule.start_date, schedule.due_date, "tarefa")?;
    check_date_order(schedule.start_date, schedule.completed_at, "tarefa")?;

    if schedule.status == TaskStatus::Concluida {
        if schedule.completed_at.is_none() {
            schedule.completed_at = Some(completion_stamp(schedule.start_date, today));
        }
    } else if status_changed && !completion_given {
        schedule.completed_at = None;
    }
    Ok(())
}

/// Date stamped on completion: `today`, never earlier than `start`.
fn completion_stamp(start: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    start.map_or(today, |start| start.max(today))
}

/// A task is overdue when its due date passed and it is not concluded.
#[must_use]
pub fn task_is_overdue(status: TaskStatus, due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_date.is_some_and(|d| d < today) && status != TaskStatus::Concluida
}

// =============================================================================
// MONITORING
// =============================================================================

/// Normalize a reference date to the first day of its month.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Severity of the notification raised when a criterion degrades.
///
/// Returns `None` unless the new status is `alerta`/`critico` and ranks
/// above the previous one (`sem_dados` for new records).
#[must_use]
pub fn degradation_severity(
    previous: Option<MonitoringStatus>,
    current: MonitoringStatus,
) -> Option<Priority> {
    let previous = previous.unwrap_or_default();
    if current <= previous {
        return None;
    }
    match current {
        MonitoringStatus::Alerta => Some(Priority::Alta),
        MonitoringStatus::Critico => Some(Priority::Critica),
        MonitoringStatus::SemDados | MonitoringStatus::Conforme => None,
    }
}

// =============================================================================
// ROOT-CAUSE ANALYSIS
// =============================================================================

/// Answers to the five whys must be filled contiguously from the first.
pub fn check_whys_contiguous(whys: [Option<&str>; WHY_COUNT]) -> Result<()> {
    let mut gap_at: Option<usize> = None;
    for (index, why) in whys.iter().enumerate() {
        if is_filled(*why) {
            if let Some(gap) = gap_at {
                return Err(ConformaError::Validation(format!(
                    "Preencha o porque {} antes do porque {}.",
                    gap + 1,
                    index + 1
                )));
            }
        } else if gap_at.is_none() {
            gap_at = Some(index);
        }
    }
    Ok(())
}

/// A concluded analysis needs a first why, a root cause and a corrective action.
pub fn check_analysis_conclusion(
    porque_1: Option<&str>,
    causa_raiz: Option<&str>,
    acao_corretiva: Option<&str>,
) -> Result<()> {
    let missing: Vec<&str> = [
        ("porque_1", porque_1),
        ("causa_raiz", causa_raiz),
        ("acao_corretiva", acao_corretiva),
    ]
    .into_iter()
    .filter(|(_, value)| !is_filled(*value))
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(ConformaError::Validation(format!(
        "Para concluir a analise preencha: {}.",
        missing.join(", ")
    )))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn project(status: ProjectStatus) -> ProjectSchedule {
        ProjectSchedule {
            status,
            data_inicio: None,
            data_fim_prevista: None,
            data_fim_real: None,
        }
    }

    #[test]
    fn end_before_start_rejected() {
        let err = check_date_order(Some(date(2026, 3, 10)), Some(date(2026, 3, 9)), "projeto");
        assert!(matches!(err, Err(ConformaError::Validation(m)) if m.contains("projeto")));
        assert!(check_date_order(Some(date(2026, 3, 10)), Some(date(2026, 3, 10)), "x").is_ok());
        assert!(check_date_order(None, Some(date(2026, 3, 10)), "x").is_ok());
    }

    #[test]
    fn concluding_project_stamps_today() {
        let today = date(2026, 5, 1);
        let mut schedule = project(ProjectStatus::Concluido);
        settle_project_schedule(&mut schedule, true, false, today).expect("valid");
        assert_eq!(schedule.data_fim_real, Some(today));
    }

    #[test]
    fn concluding_keeps_given_end_date() {
        let mut schedule = project(ProjectStatus::Concluido);
        schedule.data_fim_real = Some(date(2026, 4, 2));
        settle_project_schedule(&mut schedule, true, true, date(2026, 5, 1)).expect("valid");
        assert_eq!(schedule.data_fim_real, Some(date(2026, 4, 2)));
    }

    #[test]
    fn leaving_concluded_clears_end_date() {
        let mut schedule = project(ProjectStatus::EmAndamento);
        schedule.data_fim_real = Some(date(2026, 4, 2));
        settle_project_schedule(&mut schedule, true, false, date(2026, 5, 1)).expect("valid");
        assert_eq!(schedule.data_fim_real, None);
    }

    #[test]
    fn unrelated_update_keeps_end_date() {
        let mut schedule = project(ProjectStatus::EmAndamento);
        schedule.data_fim_real = Some(date(2026, 4, 2));
        settle_project_schedule(&mut schedule, false, false, date(2026, 5, 1)).expect("valid");
        assert_eq!(schedule.data_fim_real, Some(date(2026, 4, 2)));
    }

    #[test]
    fn early_finish_requires_concluded() {
        let mut schedule = project(ProjectStatus::EmAndamento);
        schedule.data_fim_prevista = Some(date(2026, 6, 30));
        schedule.data_fim_real = Some(date(2026, 6, 1));
        assert!(settle_project_schedule(&mut schedule, false, true, date(2026, 5, 1)).is_err());

        schedule.status = ProjectStatus::Concluido;
        assert!(settle_project_schedule(&mut schedule, true, true, date(2026, 5, 1)).is_ok());
    }

    #[test]
    fn concluding_project_before_its_start_stamps_start() {
        let start = date(2026, 6, 1);
        let mut schedule = project(ProjectStatus::Concluido);
        schedule.data_inicio = Some(start);
        settle_project_schedule(&mut schedule, true, false, date(2026, 5, 1)).expect("valid");
        assert_eq!(schedule.data_fim_real, Some(start));
    }

    #[test]
    fn task_completion_never_precedes_start() {
        let start = date(2026, 3, 1);
        let mut schedule = TaskSchedule {
            status: TaskStatus::Concluida,
            start_date: Some(start),
            due_date: Some(date(2026, 3, 20)),
            completed_at: None,
        };
        settle_task_schedule(&mut schedule, true, false, date(2026, 2, 14)).expect("valid");
        assert_eq!(schedule.completed_at, Some(start));
    }

    #[test]
    fn stale_early_finish_blocks_reopening() {
        let mut schedule = project(ProjectStatus::EmAndamento);
        schedule.data_fim_prevista = Some(date(2026, 6, 30));
        schedule.data_fim_real = Some(date(2026, 6, 1));
        assert!(settle_project_schedule(&mut schedule, true, false, date(2026, 7, 1)).is_err());

        schedule.data_fim_real = None;
        settle_project_schedule(&mut schedule, true, true, date(2026, 7, 1)).expect("valid");
        assert_eq!(schedule.data_fim_real, None);
    }

    #[test]
    fn task_completion_stamped_and_cleared() {
        let today = date(2026, 2, 14);
        let mut schedule = TaskSchedule {
            status: TaskStatus::Concluida,
            start_date: Some(date(2026, 2, 1)),
            due_date: None,
            completed_at: None,
        };
        settle_task_schedule(&mut schedule, true, false, today).expect("valid");
        assert_eq!(schedule.completed_at, Some(today));

        schedule.status = TaskStatus::EmRevisao;
        settle_task_schedule(&mut schedule, true, false, today).expect("valid");
        assert_eq!(schedule.completed_at, None);
    }

    #[test]
    fn task_completion_before_start_rejected() {
        let mut schedule = TaskSchedule {
            status: TaskStatus::Concluida,
            start_date: Some(date(2026, 2, 10)),
            due_date: None,
            completed_at: Some(date(2026, 2, 9)),
        };
        assert!(settle_task_schedule(&mut schedule, true, true, date(2026, 2, 14)).is_err());
    }

    #[test]
    fn overdue_rules() {
        let today = date(2026, 1, 10);
        let past = Some(date(2026, 1, 9));
        assert!(project_is_overdue(ProjectStatus::EmAndamento, past, today));
        assert!(!project_is_overdue(ProjectStatus::Cancelado, past, today));
        assert!(!project_is_overdue(ProjectStatus::EmAndamento, Some(today), today));
        assert!(!project_is_overdue(ProjectStatus::EmAndamento, None, today));
        assert!(task_is_overdue(TaskStatus::Bloqueada, past, today));
        assert!(!task_is_overdue(TaskStatus::Concluida, past, today));
    }

    #[test]
    fn month_normalization() {
        assert_eq!(month_start(date(2026, 7, 19)), date(2026, 7, 1));
        assert_eq!(month_start(date(2026, 7, 1)), date(2026, 7, 1));
    }

    #[test]
    fn degradation_only_on_worsening_to_alert_levels() {
        use MonitoringStatus::*;
        assert_eq!(degradation_severity(None, Alerta), Some(Priority::Alta));
        assert_eq!(degradation_severity(None, Critico), Some(Priority::Critica));
        assert_eq!(degradation_severity(Some(Alerta), Critico), Some(Priority::Critica));
        assert_eq!(degradation_severity(Some(Critico), Alerta), None);
        assert_eq!(degradation_severity(Some(Alerta), Alerta), None);
        assert_eq!(degradation_severity(None, Conforme), None);
        assert_eq!(degradation_severity(Some(Conforme), Alerta), Some(Priority::Alta));
    }

    #[test]
    fn whys_must_be_contiguous() {
        assert!(check_whys_contiguous([None, None, None, None, None]).is_ok());
        assert!(check_whys_contiguous([Some("a"), Some("b"), None, None, None]).is_ok());
        let err = check_whys_contiguous([Some("a"), Some(" "), Some("c"), None, None]);
        assert!(matches!(err, Err(ConformaError::Validation(m)) if m.contains("porque 2")));
    }

    #[test]
    fn conclusion_lists_missing_fields() {
        let err = check_analysis_conclusion(Some("a"), None, Some(""));
        assert!(
            matches!(err, Err(ConformaError::Validation(m)) if m.contains("causa_raiz") && m.contains("acao_corretiva"))
        );
        assert!(check_analysis_conclusion(Some("a"), Some("b"), Some("c")).is_ok());
    }
}
