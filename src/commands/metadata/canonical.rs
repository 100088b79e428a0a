use crate::document::Document;
use crate::model::LabelMap;

pub const FLOWCELL_TYPE_LABEL: &str = "Flowcell type";

// Later entries overwrite earlier ones that map to the same label.
pub const RUN_PARAMETER_TAGS: &[(&str, &str)] = &[
    ("RunId", "Run ID"),
    ("RunID", "Run ID"),
    ("InstrumentType", "Instrument type"),
    ("ApplicationName", "Control software"),
    ("Application", "Control software"),
    ("ApplicationVersion", "Control software version"),
    ("SystemSuiteVersion", "Control software version"),
    ("Flowcell", FLOWCELL_TYPE_LABEL),
    ("FlowCellMode", FLOWCELL_TYPE_LABEL),
    ("Mode", FLOWCELL_TYPE_LABEL),
    ("ReagentKitVersion", "Reagent kit version"),
    ("RTAVersion", "RTA Version"),
    ("RtaVersion", "RTA Version"),
];

const CONSUMABLES_PATH: [&str; 3] = ["RunParameters", "ConsumableInfo", "ConsumableInfo"];
const FLOWCELL_CONSUMABLE_TYPE: &str = "FlowCell";

pub fn canonicalize_run_parameters(document: &Document) -> LabelMap {
    let mut results = LabelMap::new();

    for (tag, label) in RUN_PARAMETER_TAGS {
        if let Some(hit) = document.find(tag).next() {
            results.insert(*label, hit.to_string());
        }
    }

    results
}

// NovaSeq X lists consumables instead of a flowcell field.
pub fn extract_flowcell_type(document: &Document) -> Option<LabelMap> {
    let consumables = CONSUMABLES_PATH
        .iter()
        .try_fold(document, |node, tag| node.get(tag))?;

    let flowcell = consumables.items().into_iter().find(|consumable| {
        consumable.get("Type").and_then(Document::as_scalar) == Some(FLOWCELL_CONSUMABLE_TYPE)
    })?;

    let value = flowcell.get("Name").or_else(|| flowcell.get("Mode"))?;

    let mut result = LabelMap::new();
    result.insert(FLOWCELL_TYPE_LABEL, value.to_string());
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> Document {
        Document::from_xml_str(xml).expect("valid xml")
    }

    #[test]
    fn later_alias_overwrites_earlier_label_in_place() {
        let document = parse(
            "<RunParameters><Flowcell>v3</Flowcell><RunID>r1</RunID><Mode>SP</Mode></RunParameters>",
        );

        let results = canonicalize_run_parameters(&document);
        let entries: Vec<_> = results.iter().collect();
        assert_eq!(entries, vec![("Run ID", "r1"), ("Flowcell type", "SP")]);
    }

    #[test]
    fn flowcell_from_single_consumable_falls_back_to_mode() {
        let document = parse(
            "<RunParameters><ConsumableInfo><ConsumableInfo>\
             <Type>FlowCell</Type><Mode>10B</Mode>\
             </ConsumableInfo></ConsumableInfo></RunParameters>",
        );

        let flowcell = extract_flowcell_type(&document).expect("flowcell entry");
        assert_eq!(flowcell.get(FLOWCELL_TYPE_LABEL), Some("10B"));
        assert_eq!(flowcell.len(), 1);
    }

    #[test]
    fn flowcell_name_wins_over_mode() {
        let document = parse(
            "<RunParameters><ConsumableInfo>\
             <ConsumableInfo><Type>Reagent</Type><Name>300 cycles</Name><Mode>300</Mode></ConsumableInfo>\
             <ConsumableInfo><Type>FlowCell</Type><Name>10B</Name><Mode>25B</Mode></ConsumableInfo>\
             </ConsumableInfo></RunParameters>",
        );

        let flowcell = extract_flowcell_type(&document).expect("flowcell entry");
        assert_eq!(flowcell.iter().collect::<Vec<_>>(), vec![(FLOWCELL_TYPE_LABEL, "10B")]);
    }

    #[test]
    fn empty_consumables_container_is_absent() {
        let document = parse("<RunParameters><ConsumableInfo/></RunParameters>");
        assert_eq!(extract_flowcell_type(&document), None);

        let document = parse("<RunParameters><ConsumableInfo></ConsumableInfo></RunParameters>");
        assert_eq!(extract_flowcell_type(&document), None);
    }

    #[test]
    fn flowcell_without_matching_consumable_is_absent() {
        let document = parse(
            "<RunParameters><ConsumableInfo>\
             <ConsumableInfo><Type>Reagent</Type><Mode>300</Mode></ConsumableInfo>\
             <ConsumableInfo><Type>Buffer</Type></ConsumableInfo>\
             </ConsumableInfo></RunParameters>",
        );

        assert_eq!(extract_flowcell_type(&document), None);
    }

    #[test]
    fn flowcell_matching_consumable_without_name_or_mode_is_absent() {
        let document = parse(
            "<RunParameters><ConsumableInfo><ConsumableInfo>\
             <Type>FlowCell</Type><SerialNumber>22</SerialNumber>\
             </ConsumableInfo></ConsumableInfo></RunParameters>",
        );

        assert_eq!(extract_flowcell_type(&document), None);
    }
}
