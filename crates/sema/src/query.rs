//! Predicate compilation and query composition for attribute filtering.

use sea_orm::sea_query::{Expr, ExprTrait, IntoColumnRef, Query, SelectStatement, SimpleExpr};
use serde_json::Value as JsonValue;

use crate::db::SemaMetadata;
use crate::filter::{normalize_filters, Compare, MetaFilter, Relation};
use crate::value::MetaValue;

/// Compile one predicate into a membership fragment: "the entity id is
/// among the owners holding an attribute whose key equals `filter.key` and
/// whose value satisfies `filter.compare` against `filter.value`".
///
/// Each fragment re-scopes to its own key match, so sibling fragments for
/// different keys combine under AND/OR without ever conflating two
/// predicates into a single record match.
pub fn has_meta_expr(
    entity_id_col: impl IntoColumnRef,
    owner_type: &str,
    filter: &MetaFilter,
) -> SimpleExpr {
    let value_col = Expr::col((SemaMetadata::Table, SemaMetadata::Value));
    let text = filter.value.as_text();
    let value_cmp = match filter.compare {
        Compare::Eq => value_col.eq(text),
        Compare::Ne => value_col.ne(text),
        Compare::Lt => value_col.lt(text),
        Compare::Lte => value_col.lte(text),
        Compare::Gt => value_col.gt(text),
        Compare::Gte => value_col.gte(text),
    };
    Expr::col(entity_id_col).in_subquery(
        Query::select()
            .from(SemaMetadata::Table)
            .column((SemaMetadata::Table, SemaMetadata::OwnerId))
            .and_where(Expr::col((SemaMetadata::Table, SemaMetadata::OwnerType)).eq(owner_type))
            .and_where(Expr::col((SemaMetadata::Table, SemaMetadata::Key)).eq(filter.key.as_str()))
            .and_where(value_cmp)
            .to_owned(),
    )
}

/// Attach already-normalized predicates to `query` as one grouped filter.
///
/// An empty slice leaves the query untouched. A single predicate always
/// combines as AND regardless of the requested relation. Every fragment in
/// the group joins with the same operator; mixing AND and OR within one
/// call is out of scope.
pub fn apply_filters(
    query: &mut SelectStatement,
    entity_id_col: impl IntoColumnRef + Clone,
    owner_type: &str,
    filters: &[MetaFilter],
    relation: Relation,
) {
    if filters.is_empty() {
        return;
    }
    let relation = if filters.len() == 1 {
        Relation::And
    } else {
        relation
    };
    let mut grouped: Option<SimpleExpr> = None;
    for filter in filters {
        let fragment = has_meta_expr(entity_id_col.clone(), owner_type, filter);
        grouped = Some(match grouped {
            Some(acc) => match relation {
                Relation::And => acc.and(fragment),
                Relation::Or => acc.or(fragment),
            },
            None => fragment,
        });
    }
    if let Some(grouped) = grouped {
        query.and_where(grouped);
    }
}

/// Normalize a raw caller-supplied filter list and attach the survivors to
/// `query`. Malformed items are dropped; the relation token resolves
/// case-sensitively with AND as the fallback.
pub fn apply_meta_filters(
    query: &mut SelectStatement,
    entity_id_col: impl IntoColumnRef + Clone,
    owner_type: &str,
    items: &[JsonValue],
    relation: &str,
) {
    let filters = normalize_filters(items);
    apply_filters(
        query,
        entity_id_col,
        owner_type,
        &filters,
        Relation::resolve(relation),
    );
}

/// Single-predicate convenience form, wrapped into a one-item group.
pub fn apply_meta_filter(
    query: &mut SelectStatement,
    entity_id_col: impl IntoColumnRef + Clone,
    owner_type: &str,
    key: &str,
    value: impl Into<MetaValue>,
    compare: Option<Compare>,
) {
    if key.is_empty() {
        return;
    }
    let filter = MetaFilter::with_compare(key, value, compare.unwrap_or(Compare::Eq));
    apply_filters(query, entity_id_col, owner_type, &[filter], Relation::And);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Alias, QueryStatementWriter, SqliteQueryBuilder, Values};
    use serde_json::json;

    fn base_query() -> SelectStatement {
        Query::select()
            .column(Alias::new("id"))
            .from(Alias::new("notes"))
            .to_owned()
    }

    fn render(query: &SelectStatement) -> (String, Values) {
        query.build(SqliteQueryBuilder)
    }

    #[test]
    fn empty_filter_list_is_a_pass_through() {
        let mut query = base_query();
        let untouched = render(&query);
        apply_meta_filters(&mut query, Alias::new("id"), "note", &[], "AND");
        assert_eq!(render(&query), untouched);
    }

    #[test]
    fn all_invalid_items_are_a_pass_through() {
        let mut query = base_query();
        let untouched = render(&query);
        let items = vec![json!({"bad": "item"}), json!(5)];
        apply_meta_filters(&mut query, Alias::new("id"), "note", &items, "AND");
        assert_eq!(render(&query), untouched);
    }

    #[test]
    fn single_predicate_ignores_the_or_relation() {
        let items = vec![json!({"key": "color", "value": "red"})];
        let mut with_or = base_query();
        apply_meta_filters(&mut with_or, Alias::new("id"), "note", &items, "OR");
        let mut with_and = base_query();
        apply_meta_filters(&mut with_and, Alias::new("id"), "note", &items, "AND");
        assert_eq!(render(&with_or), render(&with_and));
    }

    #[test]
    fn unknown_relation_token_resolves_to_and() {
        let items = vec![
            json!({"key": "color", "value": "red"}),
            json!({"key": "size", "value": "M"}),
        ];
        let mut with_xor = base_query();
        apply_meta_filters(&mut with_xor, Alias::new("id"), "note", &items, "XOR");
        let mut with_and = base_query();
        apply_meta_filters(&mut with_and, Alias::new("id"), "note", &items, "AND");
        assert_eq!(render(&with_xor), render(&with_and));
        assert!(render(&with_and).0.contains(" AND "));
    }

    #[test]
    fn or_relation_joins_fragments_with_or() {
        let items = vec![
            json!({"key": "color", "value": "red"}),
            json!({"key": "size", "value": "M"}),
        ];
        let mut query = base_query();
        apply_meta_filters(&mut query, Alias::new("id"), "note", &items, "OR");
        assert!(render(&query).0.contains(" OR "));
    }

    #[test]
    fn fragments_scope_value_to_their_own_key() {
        let mut query = base_query();
        apply_meta_filter(
            &mut query,
            Alias::new("id"),
            "note",
            "size",
            "M",
            Some(Compare::Ne),
        );
        let (sql, values) = render(&query);
        assert!(sql.contains("IN (SELECT"));
        assert!(sql.contains("\"sema_metadata\".\"key\" = ?"));
        assert!(sql.contains("\"sema_metadata\".\"value\" <> ?"));
        let bound = format!("{values:?}");
        assert!(bound.contains("size"));
        assert!(bound.contains("M"));
    }
}
