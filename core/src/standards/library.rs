use super::model::{Clause, ClauseDefinition, ClauseGroup, Standard};

pub const ISO_9001: &str = "ISO_9001";
pub const ISO_14001: &str = "ISO_14001";
pub const ISO_27001: &str = "ISO_27001";

/// Registry of standards available to a session. Passed explicitly to
/// whatever needs clause lookups; there is no global instance.
#[derive(Debug, Clone, Default)]
pub struct StandardLibrary {
    standards: Vec<Standard>,
}

impl StandardLibrary {
    pub fn new(mut standards: Vec<Standard>) -> Self {
        standards.sort_by(|a, b| a.key.cmp(&b.key));
        standards.dedup_by(|a, b| a.key == b.key);
        Self { standards }
    }

    pub fn builtin() -> Self {
        Self::new(vec![iso_9001(), iso_14001(), iso_27001()])
    }

    pub fn get(&self, standard_key: &str) -> Option<&Standard> {
        self.standards.iter().find(|s| s.key == standard_key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.standards.iter().map(|s| s.key.as_str()).collect()
    }

    pub fn resolve(&self, standard_key: &str, clause_id: &str) -> Option<ClauseDefinition> {
        self.get(standard_key)?.clause_definition(clause_id)
    }
}

fn clause(id: &str, title: &str, description: &str) -> Clause {
    Clause {
        id: id.to_string(),
        code: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        sub_clauses: vec![],
    }
}

fn clause_with(id: &str, title: &str, description: &str, subs: Vec<Clause>) -> Clause {
    Clause {
        sub_clauses: subs,
        ..clause(id, title, description)
    }
}

fn group(id: &str, title: &str, clauses: Vec<Clause>) -> ClauseGroup {
    ClauseGroup {
        id: id.to_string(),
        title: title.to_string(),
        clauses,
    }
}

// Clauses 4, 5 and 7 share wording across the Annex SL management system
// standards; `system` is spliced into the descriptions.
fn annex_sl_context(system: &str) -> ClauseGroup {
    group(
        "4",
        "Context of the organization",
        vec![
            clause(
                "4.1",
                "Understanding the organization and its context",
                "Determine external and internal issues relevant to the purpose and strategic direction of the organization.",
            ),
            clause(
                "4.2",
                "Understanding the needs and expectations of interested parties",
                "Determine interested parties relevant to the management system and their relevant requirements.",
            ),
            clause(
                "4.3",
                "Determining the scope of the management system",
                &format!("Determine the boundaries and applicability of the {} management system to establish its scope.", system),
            ),
            clause(
                "4.4",
                "Management system",
                &format!("Establish, implement, maintain and continually improve the {} management system, including the processes needed.", system),
            ),
        ],
    )
}

fn annex_sl_leadership(system: &str) -> ClauseGroup {
    group(
        "5",
        "Leadership",
        vec![
            clause(
                "5.1",
                "Leadership and commitment",
                &format!("Top management shall demonstrate leadership and commitment with respect to the {} management system.", system),
            ),
            clause(
                "5.2",
                "Policy",
                &format!("Top management shall establish a {} policy that is appropriate to the purpose of the organization.", system),
            ),
            clause(
                "5.3",
                "Organizational roles, responsibilities and authorities",
                "Ensure that responsibilities and authorities for relevant roles are assigned, communicated and understood.",
            ),
        ],
    )
}

fn annex_sl_support() -> ClauseGroup {
    group(
        "7",
        "Support",
        vec![
            clause("7.1", "Resources", "Determine and provide the resources needed for the management system."),
            clause("7.2", "Competence", "Determine the necessary competence of persons doing work under the organization's control and ensure they are competent."),
            clause("7.3", "Awareness", "Persons doing work under the organization's control shall be aware of the policy and their contribution."),
            clause("7.4", "Communication", "Determine the internal and external communications relevant to the management system."),
            clause_with(
                "7.5",
                "Documented information",
                "The management system shall include documented information required by the standard and determined as necessary.",
                vec![
                    clause("7.5.1", "General", "Maintain documented information required by the standard."),
                    clause("7.5.2", "Creating and updating", "Ensure appropriate identification, format and review when creating and updating documented information."),
                    clause("7.5.3", "Control of documented information", "Control documented information so it is available, suitable and adequately protected."),
                ],
            ),
        ],
    )
}

fn annex_sl_evaluation() -> ClauseGroup {
    group(
        "9",
        "Performance evaluation",
        vec![
            clause("9.1", "Monitoring, measurement, analysis and evaluation", "Determine what needs to be monitored and measured, the methods, and when results shall be analysed."),
            clause("9.2", "Internal audit", "Conduct internal audits at planned intervals to provide information on whether the management system conforms and is effectively implemented."),
            clause("9.3", "Management review", "Top management shall review the management system at planned intervals to ensure its continuing suitability, adequacy and effectiveness."),
        ],
    )
}

fn annex_sl_improvement() -> ClauseGroup {
    group(
        "10",
        "Improvement",
        vec![
            clause("10.1", "General", "Determine and select opportunities for improvement and implement necessary actions."),
            clause("10.2", "Nonconformity and corrective action", "React to nonconformities, evaluate the need for action to eliminate causes, and implement corrective action."),
            clause("10.3", "Continual improvement", "Continually improve the suitability, adequacy and effectiveness of the management system."),
        ],
    )
}

pub fn iso_9001() -> Standard {
    Standard {
        key: ISO_9001.to_string(),
        name: "ISO 9001:2015".to_string(),
        groups: vec![
            annex_sl_context("quality"),
            annex_sl_leadership("quality"),
            group(
                "6",
                "Planning",
                vec![
                    clause("6.1", "Actions to address risks and opportunities", "Determine the risks and opportunities that need to be addressed and plan actions to address them."),
                    clause("6.2", "Quality objectives and planning to achieve them", "Establish quality objectives at relevant functions, levels and processes."),
                    clause("6.3", "Planning of changes", "Changes to the quality management system shall be carried out in a planned manner."),
                ],
            ),
            annex_sl_support(),
            group(
                "8",
                "Operation",
                vec![
                    clause("8.1", "Operational planning and control", "Plan, implement and control the processes needed to meet the requirements for the provision of products and services."),
                    clause_with(
                        "8.2",
                        "Requirements for products and services",
                        "Determine and review the requirements for products and services offered to customers.",
                        vec![
                            clause("8.2.1", "Customer communication", "Communication with customers shall include information relating to products and services, enquiries and feedback."),
                            clause("8.2.2", "Determining the requirements", "Ensure requirements for products and services are defined."),
                        ],
                    ),
                    clause("8.4", "Control of externally provided processes, products and services", "Ensure that externally provided processes, products and services conform to requirements."),
                    clause("8.5", "Production and service provision", "Implement production and service provision under controlled conditions."),
                    clause("8.7", "Control of nonconforming outputs", "Ensure that outputs that do not conform to their requirements are identified and controlled."),
                ],
            ),
            annex_sl_evaluation(),
            annex_sl_improvement(),
        ],
    }
}

pub fn iso_14001() -> Standard {
    Standard {
        key: ISO_14001.to_string(),
        name: "ISO 14001:2015".to_string(),
        groups: vec![
            annex_sl_context("environmental"),
            annex_sl_leadership("environmental"),
            group(
                "6",
                "Planning",
                vec![
                    clause_with(
                        "6.1",
                        "Actions to address risks and opportunities",
                        "Establish the processes needed to meet the requirements for addressing risks and opportunities.",
                        vec![
                            clause("6.1.2", "Environmental aspects", "Determine the environmental aspects of activities, products and services and their associated environmental impacts."),
                            clause("6.1.3", "Compliance obligations", "Determine and have access to the compliance obligations related to environmental aspects."),
                        ],
                    ),
                    clause("6.2", "Environmental objectives and planning to achieve them", "Establish environmental objectives at relevant functions and levels."),
                ],
            ),
            annex_sl_support(),
            group(
                "8",
                "Operation",
                vec![
                    clause("8.1", "Operational planning and control", "Establish, implement, control and maintain the processes needed to meet environmental management system requirements."),
                    clause("8.2", "Emergency preparedness and response", "Establish processes needed to prepare for and respond to potential emergency situations."),
                ],
            ),
            annex_sl_evaluation(),
            annex_sl_improvement(),
        ],
    }
}

pub fn iso_27001() -> Standard {
    Standard {
        key: ISO_27001.to_string(),
        name: "ISO/IEC 27001:2022".to_string(),
        groups: vec![
            annex_sl_context("information security"),
            annex_sl_leadership("information security"),
            group(
                "6",
                "Planning",
                vec![
                    clause_with(
                        "6.1",
                        "Actions to address risks and opportunities",
                        "Plan actions to address information security risks and opportunities.",
                        vec![
                            clause("6.1.2", "Information security risk assessment", "Define and apply an information security risk assessment process."),
                            clause("6.1.3", "Information security risk treatment", "Define and apply an information security risk treatment process and produce a Statement of Applicability."),
                        ],
                    ),
                    clause("6.2", "Information security objectives and planning to achieve them", "Establish information security objectives at relevant functions and levels."),
                ],
            ),
            annex_sl_support(),
            group(
                "8",
                "Operation",
                vec![
                    clause("8.1", "Operational planning and control", "Plan, implement and control the processes needed to meet information security requirements."),
                    clause("8.2", "Information security risk assessment", "Perform information security risk assessments at planned intervals."),
                    clause("8.3", "Information security risk treatment", "Implement the information security risk treatment plan."),
                ],
            ),
            annex_sl_evaluation(),
            annex_sl_improvement(),
            group(
                "A",
                "Annex A controls",
                vec![
                    clause("A.5.1", "Policies for information security", "Information security policy and topic-specific policies shall be defined, approved, published and reviewed."),
                    clause("A.5.15", "Access control", "Rules to control physical and logical access to information shall be established and implemented."),
                    clause("A.8.13", "Information backup", "Backup copies of information, software and systems shall be maintained and regularly tested."),
                ],
            ),
        ],
    }
}
