use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::ReportError;
use crate::workflows::board::{
    resolve_placement, BoardList, BoardSnapshot, Card, CardIndex, FillStatus, ListCategory,
    VacancyType,
};

const GRADUATE_ROLE: &str = "GCE";
const DEFINE_PREFIX: &str = "Define";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Client,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleCategory {
    Engineering,
    Delivery,
    Uncategorised,
}

impl RoleCategory {
    /// Fixed grade table first, then the `CE`/`DM` suffix convention.
    pub fn for_role(role: &str) -> Self {
        match role {
            "GCE" | "JCE" | "CE" | "SCE" => Self::Engineering,
            "SDM" | "DM" | "JDM" => Self::Delivery,
            "unset" => Self::Uncategorised,
            other if other.ends_with("CE") => Self::Engineering,
            other if other.ends_with("DM") => Self::Delivery,
            _ => Self::Uncategorised,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Segment {
    OnProjectBillable,
    OnProjectNonBillable,
    Lab,
    Define,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Employment {
    Permanent,
    Contract,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledCounts {
    pub total: usize,
    pub pending_start: usize,
    pub late: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyTypeCounts {
    pub total: usize,
    pub filled: FilledCounts,
    pub unfilled: usize,
}

impl VacancyTypeCounts {
    fn record(mut self, status: FillStatus) -> Self {
        self.total += 1;
        match status {
            FillStatus::Unfilled => self.unfilled += 1,
            FillStatus::PendingStart => self.filled.pending_start += 1,
            FillStatus::Late => self.filled.late += 1,
        }
        self.filled.total = self.filled.pending_start + self.filled.late;
        self
    }

    fn merge(mut self, other: &Self) -> Self {
        self.total += other.total;
        self.unfilled += other.unfilled;
        self.filled.pending_start += other.filled.pending_start;
        self.filled.late += other.filled.late;
        self.filled.total = self.filled.pending_start + self.filled.late;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyCounts {
    pub total: usize,
    pub new_business: VacancyTypeCounts,
    pub backfill: VacancyTypeCounts,
}

impl VacancyCounts {
    fn record(mut self, vacancy_type: VacancyType, status: FillStatus) -> Self {
        self.total += 1;
        match vacancy_type {
            VacancyType::NewBusiness => self.new_business = self.new_business.record(status),
            VacancyType::Backfill => self.backfill = self.backfill.record(status),
        }
        self
    }

    fn merge(self, other: &Self) -> Self {
        Self {
            total: self.total + other.total,
            new_business: self.new_business.merge(&other.new_business),
            backfill: self.backfill.merge(&other.backfill),
        }
    }
}

/// Head counts for the people placed on one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantCounts {
    pub placed: usize,
    pub billable: usize,
    pub non_billable: usize,
    pub pending_start: usize,
    pub contractors: usize,
    pub permanent: usize,
    pub new_joiners_pending: usize,
    pub define: usize,
    pub gce: usize,
    pub non_academy: usize,
    pub levels: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBilling {
    pub project: String,
    pub project_type: ProjectType,
    pub consultants: ConsultantCounts,
    pub vacancies: VacancyCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnProjectTotals {
    pub placed: usize,
    pub billable: usize,
    pub non_billable: usize,
    pub pending_start: usize,
    pub contractors: usize,
    pub permanent: usize,
    pub new_joiners_pending: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTotals {
    pub total: usize,
    pub gce: usize,
    pub non_academy: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffProjectTotals {
    pub total: usize,
    pub lab: LabTotals,
    pub define: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingTotals {
    pub on_project: OnProjectTotals,
    pub off_project: OffProjectTotals,
    pub vacancies: VacancyCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMixEntry {
    pub segment: Segment,
    pub employment: Employment,
    pub category: RoleCategory,
    pub role: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingReport {
    pub projects: Vec<ProjectBilling>,
    pub totals: BillingTotals,
    pub role_mix: Vec<RoleMixEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BillingStatus {
    Billable,
    NonBillable,
    PendingStart,
}

/// What one card contributes to its list's counts.
#[derive(Debug, Clone, PartialEq)]
enum CardTally {
    Vacancy(VacancyType, FillStatus),
    Placed(PlacedPerson),
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
struct PlacedPerson {
    role: String,
    employment: Employment,
    segment: Segment,
    status: Option<BillingStatus>,
    new_joiner_pending: bool,
}

pub fn build(snapshot: &BoardSnapshot, today: NaiveDate) -> Result<BillingReport, ReportError> {
    let index = CardIndex::new(snapshot);

    let mut projects = Vec::new();
    let mut role_mix: BTreeMap<(Segment, Employment, RoleCategory, String), usize> =
        BTreeMap::new();

    for list in snapshot.lists.iter().filter(|list| !list.is_system()) {
        let tallies = list
            .cards
            .iter()
            .map(|card| tally_card(&index, list, card, today))
            .collect::<Result<Vec<_>, _>>()?;

        for tally in &tallies {
            if let CardTally::Placed(person) = tally {
                let key = (
                    person.segment,
                    person.employment,
                    RoleCategory::for_role(&person.role),
                    person.role.clone(),
                );
                *role_mix.entry(key).or_default() += 1;
            }
        }

        let project = tallies
            .into_iter()
            .fold(ProjectBilling::empty(list), ProjectBilling::absorb);
        if project.has_activity() {
            projects.push(project);
        }
    }

    let totals = projects
        .iter()
        .fold(BillingTotals::default(), BillingTotals::absorb);
    let role_mix = role_mix
        .into_iter()
        .map(|((segment, employment, category, role), count)| RoleMixEntry {
            segment,
            employment,
            category,
            role,
            count,
        })
        .collect();

    Ok(BillingReport {
        projects,
        totals,
        role_mix,
    })
}

fn tally_card(
    index: &CardIndex<'_>,
    list: &BoardList,
    card: &Card,
    today: NaiveDate,
) -> Result<CardTally, ReportError> {
    let field_error = |source| ReportError::field(list, source);

    if let Some(vacancy_type) = card.vacancy_type() {
        if list.category != ListCategory::Project {
            return Ok(CardTally::Ignored);
        }
        let resolution = resolve_placement(index, card, today).map_err(field_error)?;
        return Ok(CardTally::Vacancy(vacancy_type, resolution.status));
    }
    if card.is_backfill_option() || !card.has_role_field() {
        return Ok(CardTally::Ignored);
    }

    let role = match card.role().map_err(field_error)?.map(str::trim) {
        Some(role) if !role.is_empty() => role.to_string(),
        _ => "unset".to_string(),
    };
    let starts_later = card
        .start_date()
        .map_err(field_error)?
        .is_some_and(|start| start > today);
    let employment = if card.is_contractor() {
        Employment::Contract
    } else {
        Employment::Permanent
    };

    let (segment, status) = match list.category {
        ListCategory::Project => {
            let status = if card.is_non_billing() {
                BillingStatus::NonBillable
            } else if starts_later {
                BillingStatus::PendingStart
            } else {
                BillingStatus::Billable
            };
            let segment = if status == BillingStatus::Billable {
                Segment::OnProjectBillable
            } else {
                Segment::OnProjectNonBillable
            };
            (segment, Some(status))
        }
        ListCategory::Internal if list.name.starts_with(DEFINE_PREFIX) => (Segment::Define, None),
        ListCategory::Internal | ListCategory::System => (Segment::Lab, None),
    };

    Ok(CardTally::Placed(PlacedPerson {
        role,
        employment,
        segment,
        status,
        new_joiner_pending: card.is_new_joiner() && starts_later,
    }))
}

impl ProjectBilling {
    fn empty(list: &BoardList) -> Self {
        let project_type = match list.category {
            ListCategory::Project => ProjectType::Client,
            ListCategory::Internal | ListCategory::System => ProjectType::Internal,
        };
        Self {
            project: list.display_name.clone(),
            project_type,
            consultants: ConsultantCounts::default(),
            vacancies: VacancyCounts::default(),
        }
    }

    fn absorb(mut self, tally: CardTally) -> Self {
        match tally {
            CardTally::Ignored => {}
            CardTally::Vacancy(vacancy_type, status) => {
                self.vacancies = self.vacancies.record(vacancy_type, status);
            }
            CardTally::Placed(person) => {
                let counts = &mut self.consultants;
                counts.placed += 1;
                *counts.levels.entry(person.role.clone()).or_default() += 1;
                match person.employment {
                    Employment::Contract => counts.contractors += 1,
                    Employment::Permanent => counts.permanent += 1,
                }
                match person.status {
                    Some(BillingStatus::Billable) => counts.billable += 1,
                    Some(BillingStatus::NonBillable) => counts.non_billable += 1,
                    Some(BillingStatus::PendingStart) => {
                        counts.non_billable += 1;
                        counts.pending_start += 1;
                    }
                    None => {}
                }
                match person.segment {
                    Segment::Define => counts.define += 1,
                    Segment::Lab if person.role == GRADUATE_ROLE => counts.gce += 1,
                    Segment::Lab => counts.non_academy += 1,
                    Segment::OnProjectBillable | Segment::OnProjectNonBillable => {}
                }
                if person.new_joiner_pending {
                    counts.new_joiners_pending += 1;
                }
            }
        }
        self
    }

    fn has_activity(&self) -> bool {
        self.consultants.placed > 0 || self.vacancies.total > 0
    }
}

impl BillingTotals {
    fn absorb(mut self, project: &ProjectBilling) -> Self {
        let counts = &project.consultants;
        match project.project_type {
            ProjectType::Client => {
                let on = &mut self.on_project;
                on.placed += counts.placed;
                on.billable += counts.billable;
                on.non_billable += counts.non_billable;
                on.pending_start += counts.pending_start;
                on.contractors += counts.contractors;
                on.permanent += counts.permanent;
                on.new_joiners_pending += counts.new_joiners_pending;
                self.vacancies = self.vacancies.merge(&project.vacancies);
            }
            ProjectType::Internal => {
                let off = &mut self.off_project;
                off.total += counts.placed;
                off.define += counts.define;
                off.lab.total += counts.gce + counts.non_academy;
                off.lab.gce += counts.gce;
                off.lab.non_academy += counts.non_academy;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::board::{fields, labels, FieldValue};
    use chrono::Duration;

    const VACANCY_ID: &str = "0123456789abcdef01234567";
    const PERSON_ID: &str = "fedcba9876543210fedcba98";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("valid date")
    }

    fn person(id: &str, role: &str) -> Card {
        Card::new(id, format!("Person {id}"), "").with_field(
            fields::ROLE,
            FieldValue::Text(role.to_string()),
        )
    }

    fn report(lists: Vec<BoardList>) -> BillingReport {
        build(&BoardSnapshot::new(lists), today()).expect("report builds")
    }

    #[test]
    fn billable_permanent_consultant() {
        let report = report(vec![BoardList::new(
            "l1",
            "Project - Acme",
            vec![person("c1", "GCE")],
        )]);

        let acme = &report.projects[0];
        assert_eq!(acme.project, "Acme");
        assert_eq!(acme.project_type, ProjectType::Client);
        assert_eq!(acme.consultants.placed, 1);
        assert_eq!(acme.consultants.billable, 1);
        assert_eq!(acme.consultants.permanent, 1);
        assert_eq!(acme.consultants.pending_start, 0);
        assert_eq!(report.totals.on_project.placed, 1);
        assert_eq!(report.totals.on_project.billable, 1);
    }

    #[test]
    fn future_start_is_pending_and_not_billable() {
        let card = person("c1", "GCE").with_field(
            fields::PROJECT_START_DATE,
            FieldValue::Date(today() + Duration::days(1)),
        );
        let report = report(vec![BoardList::new("l1", "Project - Acme", vec![card])]);

        let counts = &report.projects[0].consultants;
        assert_eq!(counts.placed, 1);
        assert_eq!(counts.billable, 0);
        assert_eq!(counts.pending_start, 1);
        assert_eq!(counts.non_billable, 1);
    }

    #[test]
    fn start_today_is_billable() {
        let card = person("c1", "SCE")
            .with_field(fields::PROJECT_START_DATE, FieldValue::Date(today()));
        let report = report(vec![BoardList::new("l1", "Project - Acme", vec![card])]);
        assert_eq!(report.totals.on_project.billable, 1);
    }

    #[test]
    fn labels_drive_billing_and_employment() {
        let cards = vec![
            person("c1", "SCE").with_label(labels::NON_BILLING),
            person("c2", "CE").with_label(labels::CONTRACTOR),
            person("c3", "SCE").with_label(labels::BACKFILL_OPTION),
            Card::new("c4", "Placeholder", ""),
        ];
        let report = report(vec![BoardList::new("l1", "Project - Acme", cards)]);

        let totals = &report.totals.on_project;
        assert_eq!(totals.placed, 2);
        assert_eq!(totals.billable, 1);
        assert_eq!(totals.non_billable, 1);
        assert_eq!(totals.contractors, 1);
        assert_eq!(totals.permanent, 1);
    }

    #[test]
    fn vacancies_never_count_as_placed() {
        let vacancy = person("c1", "SCE").with_label(labels::VACANCY);
        let report = report(vec![BoardList::new("l1", "Project - Acme", vec![vacancy])]);

        let acme = &report.projects[0];
        assert_eq!(acme.consultants.placed, 0);
        assert_eq!(acme.vacancies.total, 1);
        assert_eq!(acme.vacancies.new_business.unfilled, 1);
        assert_eq!(report.totals.vacancies.total, 1);
    }

    #[test]
    fn filled_vacancies_split_by_start() {
        let vacancy = Card::new(VACANCY_ID, "Backfill SCE", "")
            .with_label(labels::BACKFILL_VACANCY)
            .with_field(fields::PLACEMENT, FieldValue::Text(PERSON_ID.to_string()));
        let placed = person(PERSON_ID, "SCE")
            .with_field(fields::PLACEMENT, FieldValue::Text(VACANCY_ID.to_string()))
            .with_field(
                fields::PROJECT_START_DATE,
                FieldValue::Date(today() - Duration::days(1)),
            );
        let report = report(vec![
            BoardList::new("l1", "Project - Acme", vec![vacancy]),
            BoardList::new("l2", "Lab", vec![placed]),
        ]);

        let backfill = &report.totals.vacancies.backfill;
        assert_eq!(backfill.total, 1);
        assert_eq!(backfill.filled.late, 1);
        assert_eq!(backfill.filled.total, 1);
        assert_eq!(backfill.unfilled, 0);
        assert_eq!(report.totals.vacancies.new_business.total, 0);
    }

    #[test]
    fn internal_lists_split_into_lab_and_define() {
        let report = report(vec![
            BoardList::new(
                "l1",
                "Lab",
                vec![person("c1", "GCE"), person("c2", "SCE"), person("c3", "DM")],
            ),
            BoardList::new("l2", "Define - Discovery", vec![person("c4", "GCE")]),
            BoardList::new("l3", "Done", vec![person("c5", "SCE")]),
        ]);

        let off = &report.totals.off_project;
        assert_eq!(off.total, 4);
        assert_eq!(off.define, 1);
        assert_eq!(off.lab.total, 3);
        assert_eq!(off.lab.gce, 1);
        assert_eq!(off.lab.non_academy, 2);
        assert_eq!(report.totals.on_project, OnProjectTotals::default());
        assert_eq!(report.projects.len(), 2, "system list is skipped");
        assert_eq!(report.projects[0].project_type, ProjectType::Internal);
    }

    #[test]
    fn vacancies_on_internal_lists_are_not_counted() {
        let vacancy = Card::new("c1", "Lab vacancy", "").with_label(labels::VACANCY);
        let report = report(vec![BoardList::new("l1", "Lab", vec![vacancy])]);
        assert!(report.projects.is_empty());
        assert_eq!(report.totals.vacancies, VacancyCounts::default());
    }

    #[test]
    fn board_totals_sum_projects() {
        let report = report(vec![
            BoardList::new("l1", "Project - Acme", vec![person("c1", "SCE"), person("c2", "CE")]),
            BoardList::new(
                "l2",
                "Project - Globex (phase 2)",
                vec![person("c3", "DM").with_label(labels::CONTRACTOR)],
            ),
        ]);
        assert_eq!(report.projects[1].project, "Globex");
        assert_eq!(report.totals.on_project.placed, 3);
        assert_eq!(report.totals.on_project.contractors, 1);
        assert_eq!(
            report.projects[0].consultants.levels.get("SCE").copied(),
            Some(1)
        );
    }

    #[test]
    fn new_joiners_waiting_to_start_are_flagged() {
        let card = person("c1", "GCE")
            .with_label(labels::NEW_JOINER)
            .with_field(
                fields::PROJECT_START_DATE,
                FieldValue::Date(today() + Duration::days(30)),
            );
        let report = report(vec![BoardList::new("l1", "Project - Acme", vec![card])]);
        assert_eq!(report.totals.on_project.new_joiners_pending, 1);
        assert_eq!(report.totals.on_project.pending_start, 1);
    }

    #[test]
    fn role_categories_fall_back_to_suffix_rules() {
        assert_eq!(RoleCategory::for_role("GCE"), RoleCategory::Engineering);
        assert_eq!(RoleCategory::for_role("PCE"), RoleCategory::Engineering);
        assert_eq!(RoleCategory::for_role("JDM"), RoleCategory::Delivery);
        assert_eq!(RoleCategory::for_role("PDM"), RoleCategory::Delivery);
        assert_eq!(RoleCategory::for_role("Recruiter"), RoleCategory::Uncategorised);
        assert_eq!(RoleCategory::for_role("unset"), RoleCategory::Uncategorised);
    }

    #[test]
    fn role_mix_groups_by_segment_and_category() {
        let report = report(vec![
            BoardList::new(
                "l1",
                "Project - Acme",
                vec![
                    person("c1", "SCE"),
                    person("c2", "SCE"),
                    person("c3", "DM").with_label(labels::NON_BILLING),
                ],
            ),
            BoardList::new("l2", "Lab", vec![person("c4", "")]),
        ]);

        assert_eq!(
            report.role_mix,
            vec![
                RoleMixEntry {
                    segment: Segment::OnProjectBillable,
                    employment: Employment::Permanent,
                    category: RoleCategory::Engineering,
                    role: "SCE".to_string(),
                    count: 2,
                },
                RoleMixEntry {
                    segment: Segment::OnProjectNonBillable,
                    employment: Employment::Permanent,
                    category: RoleCategory::Delivery,
                    role: "DM".to_string(),
                    count: 1,
                },
                RoleMixEntry {
                    segment: Segment::Lab,
                    employment: Employment::Permanent,
                    category: RoleCategory::Uncategorised,
                    role: "unset".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn malformed_start_date_surfaces_list_context() {
        let card = person("c1", "SCE")
            .with_field(fields::PROJECT_START_DATE, FieldValue::Text("soon".to_string()));
        let snapshot = BoardSnapshot::new(vec![BoardList::new("l1", "Project - Acme", vec![card])]);
        match build(&snapshot, today()) {
            Err(ReportError::Field { list_id, source, .. }) => {
                assert_eq!(list_id, "l1");
                assert_eq!(source.card_id, "c1");
            }
            other => panic!("expected field error, got {other:?}"),
        }
    }
}
