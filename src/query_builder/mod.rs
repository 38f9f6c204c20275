//! Builds MDX `SELECT` statements from declarative axis selections.
//!
//! Selectors accumulate per axis in appearance order and are serialized on
//! demand: fragments are expanded with their member functions, grouped by
//! enclosing hierarchy, combined into left-associative `UNION` trees per
//! hierarchy and a left-associative `CROSSJOIN` tree across hierarchies, and
//! the whole set is wrapped in `HIERARCHIZE`. Single-selector axes and pure
//! `[Measures]` axes shortcut to a literal set.

use crate::error::MdxError;
use crate::util::ordered_group::OrderedGroups;
use itertools::Itertools;

/// The hierarchy whose axis expressions are emitted as literal sets.
const MEASURES_HIERARCHY: &str = "[Measures]";

/// The two query axes supported by the builder.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Axis {
    Columns,
    Rows,
}

/// Member functions that can be applied to a selected identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SelectorProperty {
    /// Expands the member to its children (`.CHILDREN`).
    Children,
    /// Drills down one level (`DRILLDOWNLEVEL(...)`). Ignored on root-level
    /// members, where drilling down a dimension root is not meaningful.
    DrilldownLevel,
}

/// A request for one MDX identifier on one axis.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, new)]
pub struct Selector {
    pub id: String,
    pub properties: Vec<SelectorProperty>,
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Self { id: id.to_owned(), properties: Vec::new() }
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Self { id, properties: Vec::new() }
    }
}

/// Accumulates axis selections, a source cube and filter conditions, and
/// serializes them to an MDX statement.
///
/// The builder is a plain mutable value holder: serialization re-derives the
/// statement from the current state on every call, and instances are not
/// thread-safe. Share across threads only behind external synchronization.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    columns: Vec<Selector>,
    rows: Vec<Selector>,
    cube: Option<String>,
    conditions: Vec<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `selectors` to `axis` in argument order. Empty iterators are
    /// accepted as no-ops. Identifier syntax is not validated here.
    pub fn select<I, S>(&mut self, axis: Axis, selectors: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
    {
        let target = match axis {
            Axis::Columns => &mut self.columns,
            Axis::Rows => &mut self.rows,
        };
        target.extend(selectors.into_iter().map(Into::into));
        self
    }

    /// Sets the source cube, overwriting any previous value.
    #[allow(clippy::should_implement_trait)] // The MDX FROM clause, not a conversion.
    pub fn from<C: Into<String>>(&mut self, cube: C) -> &mut Self {
        self.cube = Some(cube.into());
        self
    }

    /// Appends raw `WHERE` condition expressions in argument order.
    pub fn filter<I, S>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.extend(conditions.into_iter().map(Into::into));
        self
    }

    /// Serializes the current state to an MDX statement. Pure function of the
    /// builder state; calling it twice without mutation yields identical
    /// strings.
    pub fn to_mdx(&self) -> Result<String, MdxError> {
        let mut clauses = Vec::new();

        let columns = build_axis(&self.columns)?;
        let rows = build_axis(&self.rows)?;
        if columns.is_some() || rows.is_some() {
            let mut fields = Vec::new();
            if let Some(columns) = columns {
                fields.push(format!("{} ON COLUMNS", columns));
            }
            if let Some(rows) = rows {
                fields.push(format!("{} ON ROWS", rows));
            }
            clauses.push(format!("SELECT {}", fields.iter().format(", ")));
        }

        if let Some(cube) = &self.cube {
            clauses.push(format!("FROM {}", cube));
        }

        if !self.conditions.is_empty() {
            clauses.push(format!("WHERE ( {} )", build_conditions(&self.conditions)?));
        }

        Ok(clauses.iter().format(" ").to_string())
    }
}

/// Serializes one axis, or `None` if no selectors were requested for it.
fn build_axis(selectors: &[Selector]) -> Result<Option<String>, MdxError> {
    if selectors.is_empty() {
        return Ok(None);
    }

    let mut hierarchies = OrderedGroups::new();
    for selector in selectors {
        let hierarchy = extract_hierarchy(&selector.id)?.to_owned();
        hierarchies.insert(hierarchy, expand(selector));
    }

    let groups = hierarchies.iter().collect_vec();
    let expression = if let [(hierarchy, fragments)] = groups.as_slice() {
        if hierarchy.as_str() == MEASURES_HIERARCHY || selectors.len() == 1 {
            // Measures and single selectors are emitted as a literal set.
            format!("{{ {} }}", fragments.iter().format(", "))
        } else {
            format!("HIERARCHIZE({})", build_union(fragments))
        }
    } else {
        let crossjoined =
            build_crossjoin(groups.iter().map(|(_, fragments)| build_union(fragments)));
        format!("HIERARCHIZE({})", crossjoined)
    };

    Ok(Some(expression))
}

/// Expands a selector to its literal MDX fragment by applying its member
/// functions. `Children` applies before `DrilldownLevel`, so a selector with
/// both yields `DRILLDOWNLEVEL(id.CHILDREN)`.
fn expand(selector: &Selector) -> String {
    let mut fragment = selector.id.clone();

    if selector.properties.contains(&SelectorProperty::Children) {
        fragment.push_str(".CHILDREN");
    }

    if selector.properties.contains(&SelectorProperty::DrilldownLevel)
        && segment_depth(&selector.id) > 1
    {
        fragment = format!("DRILLDOWNLEVEL({})", fragment);
    }

    fragment
}

/// Returns the leading bracketed hierarchy segment of `identifier`, e.g.
/// `[Store]` for `[Store].[All Stores].[USA]`.
fn extract_hierarchy(identifier: &str) -> Result<&str, MdxError> {
    let mut offset = 0;
    while let Some(start) = identifier[offset..].find('[') {
        let start = offset + start;
        match identifier[start + 1..].find(']') {
            Some(end) if end > 0 => return Ok(&identifier[start..=start + 1 + end]),
            Some(end) => offset = start + 1 + end + 1,
            None => break,
        }
    }
    Err(MdxError::MalformedIdentifier(identifier.to_owned()))
}

/// Number of bracketed segments in `identifier`. Root-level members (a bare
/// dimension or hierarchy reference) have depth 1.
fn segment_depth(identifier: &str) -> usize {
    let mut depth = 0;
    let mut rest = identifier;
    while let Some(start) = rest.find('[') {
        match rest[start + 1..].find(']') {
            Some(end) => {
                depth += 1;
                rest = &rest[start + 1 + end + 1..];
            }
            None => break,
        }
    }
    depth
}

/// Left-folds `fragments` into a binary `UNION` tree. A single fragment is a
/// literal set.
fn build_union(fragments: &[String]) -> String {
    if let [fragment] = fragments {
        return format!("{{ {} }}", fragment);
    }
    fragments
        .iter()
        .map(|fragment| build_field(fragment))
        .reduce(|unionized, field| format!("UNION({}, {})", unionized, field))
        .unwrap_or_default()
}

/// Left-folds per-hierarchy set expressions into a binary `CROSSJOIN` tree.
fn build_crossjoin<I: Iterator<Item = String>>(hierarchies: I) -> String {
    hierarchies
        .reduce(|crossjoined, hierarchy| format!("CROSSJOIN({}, {})", crossjoined, hierarchy))
        .unwrap_or_default()
}

/// Bare dimension references need braces to form a valid set; qualified
/// member paths do not.
fn build_field(fragment: &str) -> String {
    if fragment.contains('.') {
        fragment.to_owned()
    } else {
        format!("{{ {} }}", fragment)
    }
}

/// Groups conditions by hierarchy, braces same-hierarchy conditions into one
/// set, and joins the groups with MDX intersection.
fn build_conditions(conditions: &[String]) -> Result<String, MdxError> {
    let mut hierarchies = OrderedGroups::new();
    for condition in conditions {
        hierarchies.insert(extract_hierarchy(condition)?.to_owned(), condition.as_str());
    }

    let joined = hierarchies
        .iter()
        .map(|(_, group)| {
            if let [condition] = group {
                (*condition).to_owned()
            } else {
                format!("{{{}}}", group.iter().format(", "))
            }
        })
        .format(" * ");
    Ok(joined.to_string())
}

#[cfg(test)]
mod tests {
    use crate::error::MdxError;
    use crate::query_builder::{Axis, QueryBuilder, Selector, SelectorProperty};

    fn selector(id: &str, properties: Vec<SelectorProperty>) -> Selector {
        Selector::new(id.to_owned(), properties)
    }

    #[test]
    fn empty_builder_serializes_to_nothing() {
        let builder = QueryBuilder::new();
        assert_eq!(builder.to_mdx().expect("serialization failed"), "");
    }

    #[test]
    fn ignores_empty_selector_lists() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Columns, Vec::<Selector>::new());
        builder.select(Axis::Rows, Vec::<Selector>::new());
        assert_eq!(builder.to_mdx().expect("serialization failed"), "");
    }

    #[test]
    fn single_selector_on_columns() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Columns, vec!["[Store].[All Stores]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Store].[All Stores] } ON COLUMNS"
        );
    }

    #[test]
    fn single_selector_on_rows() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Store].[All Stores]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Store].[All Stores] } ON ROWS"
        );
    }

    #[test]
    fn two_selectors_in_one_hierarchy() {
        let mut builder = QueryBuilder::new();
        builder
            .select(Axis::Columns, vec!["[Store].[All Stores]", "[Store].[All Stores].CHILDREN"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION([Store].[All Stores], [Store].[All Stores].CHILDREN)) \
             ON COLUMNS"
        );
    }

    #[test]
    fn both_axes() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Store].[All Stores]"]);
        builder.select(Axis::Columns, vec!["[Measures].[Unit Sales]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Measures].[Unit Sales] } ON COLUMNS, { [Store].[All Stores] } ON ROWS"
        );
    }

    #[test]
    fn measures_axis_stays_a_literal_set() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Measures].[Unit Sales]", "[Measures].[Sales Count]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Measures].[Unit Sales], [Measures].[Sales Count] } ON ROWS"
        );
    }

    #[test]
    fn children_property_appends_member_function() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![selector("[Store].[All Stores].[USA]", vec![SelectorProperty::Children])],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Store].[All Stores].[USA].CHILDREN } ON ROWS"
        );
    }

    #[test]
    fn drilldownlevel_wraps_nested_members() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![selector("[Store].[All Stores].[USA]", vec![SelectorProperty::DrilldownLevel])],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { DRILLDOWNLEVEL([Store].[All Stores].[USA]) } ON ROWS"
        );
    }

    #[test]
    fn drilldownlevel_is_ignored_on_root_members() {
        let mut builder = QueryBuilder::new();
        builder
            .select(Axis::Rows, vec![selector("[Geography]", vec![SelectorProperty::DrilldownLevel])]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT { [Geography] } ON ROWS"
        );
    }

    #[test]
    fn plain_and_property_selectors_mix() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                selector("[Store].[All Stores]", vec![]),
                selector("[Store].[All Stores]", vec![SelectorProperty::Children]),
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION([Store].[All Stores], [Store].[All Stores].CHILDREN)) ON ROWS"
        );
    }

    #[test]
    fn bare_dimension_is_braced_inside_union() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                selector("[Geography]", vec![]),
                selector("[Geography].[All Geographys]", vec![SelectorProperty::Children]),
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION({ [Geography] }, [Geography].[All Geographys].CHILDREN)) \
             ON ROWS"
        );
    }

    #[test]
    fn member_functions_combine_inside_union() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                selector("[Store].[All Stores]", vec![SelectorProperty::Children]),
                selector("[Store].[All Stores]", vec![SelectorProperty::DrilldownLevel]),
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION([Store].[All Stores].CHILDREN, \
             DRILLDOWNLEVEL([Store].[All Stores]))) ON ROWS"
        );
    }

    #[test]
    fn three_members_left_fold_two_unions() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                "[Store].[All Stores].[USA]",
                "[Store].[All Stores].[Israel]",
                "[Store].[All Stores].[Canada]",
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel]), [Store].[All Stores].[Canada])) ON ROWS"
        );
    }

    #[test]
    fn five_members_left_fold_four_unions() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                "[Store].[All Stores].[USA]",
                "[Store].[All Stores].[Israel]",
                "[Store].[All Stores].[Canada]",
                "[Store].[All Stores].[Mexico]",
                "[Store].[All Stores].[Vatican]",
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION(UNION(UNION(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel]), [Store].[All Stores].[Canada]), \
             [Store].[All Stores].[Mexico]), [Store].[All Stores].[Vatican])) ON ROWS"
        );
    }

    #[test]
    fn two_dimensions_crossjoin() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Store]", "[Store Type]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(CROSSJOIN({ [Store] }, { [Store Type] })) ON ROWS"
        );
    }

    #[test]
    fn union_nested_inside_crossjoin() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec!["[Store].[All Stores].[USA]", "[Store].[All Stores].[Israel]", "[Store Type]"],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(CROSSJOIN(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel]), { [Store Type] })) ON ROWS"
        );
    }

    #[test]
    fn unions_on_both_sides_of_crossjoin() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                "[Store].[All Stores].[USA]",
                "[Store].[All Stores].[Israel]",
                "[Store].[All Stores].[Canada]",
                "[Store Type].[All Store Types].[Deluxe Supermarket]",
                "[Store Type].[All Store Types].[HeadQuarters]",
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(CROSSJOIN(UNION(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel]), [Store].[All Stores].[Canada]), \
             UNION([Store Type].[All Store Types].[Deluxe Supermarket], \
             [Store Type].[All Store Types].[HeadQuarters]))) ON ROWS"
        );
    }

    #[test]
    fn three_dimensions_nest_two_crossjoins() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                "[Store].[All Stores].[USA]",
                "[Store].[All Stores].[Israel]",
                "[Store Type].[All Store Types].[Deluxe Supermarket]",
                "[Store Type].[All Store Types].[HeadQuarters]",
                "[Product].[All Products].[Food]",
                "[Product].[All Products].[Drink]",
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(CROSSJOIN(CROSSJOIN(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel]), UNION([Store Type].[All Store Types].\
             [Deluxe Supermarket], [Store Type].[All Store Types].[HeadQuarters])), \
             UNION([Product].[All Products].[Food], [Product].[All Products].[Drink]))) ON ROWS"
        );
    }

    #[test]
    fn member_functions_apply_inside_crossjoined_unions() {
        let mut builder = QueryBuilder::new();
        builder.select(
            Axis::Rows,
            vec![
                selector("[Store].[All Stores].[USA]", vec![]),
                selector("[Store].[All Stores].[Israel]", vec![SelectorProperty::Children]),
                selector("[Store Type].[All Store Types].[Deluxe Supermarket]", vec![]),
                selector("[Store Type].[All Store Types].[HeadQuarters]", vec![]),
                selector("[Product].[All Products].[Food]", vec![]),
                selector("[Product].[All Products].[Drink]", vec![SelectorProperty::DrilldownLevel]),
            ],
        );
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(CROSSJOIN(CROSSJOIN(UNION([Store].[All Stores].[USA], \
             [Store].[All Stores].[Israel].CHILDREN), UNION([Store Type].[All Store Types].\
             [Deluxe Supermarket], [Store Type].[All Store Types].[HeadQuarters])), \
             UNION([Product].[All Products].[Food], \
             DRILLDOWNLEVEL([Product].[All Products].[Drink])))) ON ROWS"
        );
    }

    #[test]
    fn from_without_axes_emits_no_select() {
        let mut builder = QueryBuilder::new();
        builder.from("[Sales]");
        assert_eq!(builder.to_mdx().expect("serialization failed"), "FROM [Sales]");
    }

    #[test]
    fn ignores_empty_condition_lists() {
        let mut builder = QueryBuilder::new();
        builder.filter(Vec::<String>::new());
        assert_eq!(builder.to_mdx().expect("serialization failed"), "");
    }

    #[test]
    fn single_condition() {
        let mut builder = QueryBuilder::new();
        builder.filter(vec!["[Measures].[Unit Sales]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "WHERE ( [Measures].[Unit Sales] )"
        );
    }

    #[test]
    fn conditions_on_different_hierarchies_intersect() {
        let mut builder = QueryBuilder::new();
        builder.filter(vec!["[Measures].[Unit Sales]", "[Store].[All Stores]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "WHERE ( [Measures].[Unit Sales] * [Store].[All Stores] )"
        );
    }

    #[test]
    fn conditions_on_one_hierarchy_brace_into_a_set() {
        let mut builder = QueryBuilder::new();
        builder.filter(vec!["[Time].[1997].[Q1]", "[Time].[1997].[Q2]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "WHERE ( {[Time].[1997].[Q1], [Time].[1997].[Q2]} )"
        );
    }

    #[test]
    fn mixed_condition_groups() {
        let mut builder = QueryBuilder::new();
        builder.filter(vec![
            "[Time].[1997].[Q1]",
            "[Store Type].[Supermarket]",
            "[Time].[1997].[Q2]",
        ]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "WHERE ( {[Time].[1997].[Q1], [Time].[1997].[Q2]} * [Store Type].[Supermarket] )"
        );
    }

    #[test]
    fn whole_query_with_chaining() {
        let mut builder = QueryBuilder::new();
        builder
            .select(Axis::Columns, vec!["[Store].[All Stores]", "[Store].[All Stores].CHILDREN"])
            .select(Axis::Rows, vec!["[Measures].[Unit Sales]", "[Measures].[Sales Count]"])
            .from("[Sales]")
            .filter(vec!["[Store Type].[All Store Types].[Supermarket]"]);
        assert_eq!(
            builder.to_mdx().expect("serialization failed"),
            "SELECT HIERARCHIZE(UNION([Store].[All Stores], [Store].[All Stores].CHILDREN)) \
             ON COLUMNS, { [Measures].[Unit Sales], [Measures].[Sales Count] } ON ROWS \
             FROM [Sales] WHERE ( [Store Type].[All Store Types].[Supermarket] )"
        );
    }

    #[test]
    fn serialization_is_idempotent() {
        let mut builder = QueryBuilder::new();
        builder
            .select(Axis::Rows, vec!["[Store]", "[Store Type]"])
            .from("[Sales]")
            .filter(vec!["[Time].[1997]"]);
        let first = builder.to_mdx().expect("serialization failed");
        let second = builder.to_mdx().expect("serialization failed");
        assert_eq!(first, second);
    }

    #[test]
    fn mutation_after_serialization_changes_output() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Store]"]);
        let first = builder.to_mdx().expect("serialization failed");
        builder.select(Axis::Rows, vec!["[Store Type]"]);
        let second = builder.to_mdx().expect("serialization failed");
        assert_ne!(first, second);
        assert_eq!(first, "SELECT { [Store] } ON ROWS");
        assert_eq!(
            second,
            "SELECT HIERARCHIZE(CROSSJOIN({ [Store] }, { [Store Type] })) ON ROWS"
        );
    }

    #[test]
    fn malformed_selector_identifier_fails() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["Store without brackets"]);
        match builder.to_mdx() {
            Err(MdxError::MalformedIdentifier(identifier)) => {
                assert_eq!(identifier, "Store without brackets");
            }
            other => panic!("Expected a malformed identifier error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_condition_fails() {
        let mut builder = QueryBuilder::new();
        builder.select(Axis::Rows, vec!["[Store]"]).filter(vec!["[]"]);
        match builder.to_mdx() {
            Err(MdxError::MalformedIdentifier(identifier)) => assert_eq!(identifier, "[]"),
            other => panic!("Expected a malformed identifier error, got {:?}", other),
        }
    }
}
