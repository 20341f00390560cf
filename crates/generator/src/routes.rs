//! Route building
//!
//! A route is a path from the entry container down through navigation
//! properties, e.g. `books/{BookId}/authors`. The builder walks the schema
//! graph depth first and produces a [`RouteTree`]: an arena of
//! [`RouteNode`]s linked to their parents by index.
//!
//! A child is never admitted when its property already occurs on the path
//! from the root, so a self-referencing type yields one level of recursion
//! and then stops.
//!
//! Navigation properties declared on derived types are reached through a
//! typecast segment. When sibling derived types declare same-named
//! navigation properties, each gets its own route and the typecast
//! placeholder is named after the cast type instead of the segment.

use crate::types::to_parameter_type;
use odata_cmdgen_common::naming::{singularize, to_pascal_case, unique_name};
use odata_cmdgen_common::{
    ClassId, GeneratorConfig, GeneratorError, ParameterType, PropertyId, Result, SchemaGraph,
    TypeRef,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, trace};

/// Index of a node in a [`RouteTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteNodeId(pub usize);

/// Derived class a route segment is cast to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentCast {
    pub class: ClassId,
    /// Name the placeholder after the class; set when a sibling derived
    /// type declares a same-named navigation property
    pub by_type: bool,
}

/// One route: a navigation property reached through its parent route
#[derive(Debug, Clone)]
pub struct RouteNode {
    id: RouteNodeId,
    property: PropertyId,
    parent: Option<RouteNodeId>,
    /// Cast applied to the parent segment before this one
    cast: Option<SegmentCast>,
    /// Properties from the root to this node, cached on construction
    path: Vec<PropertyId>,
    /// Path indices whose segment addresses an entity collection
    id_segments: Vec<usize>,
    /// Path index -> cast applied to that segment
    typecast_segments: BTreeMap<usize, SegmentCast>,
}

impl RouteNode {
    pub fn id(&self) -> RouteNodeId {
        self.id
    }

    pub fn property(&self) -> PropertyId {
        self.property
    }

    pub fn parent(&self) -> Option<RouteNodeId> {
        self.parent
    }

    pub fn cast(&self) -> Option<ClassId> {
        self.cast.map(|c| c.class)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[PropertyId] {
        &self.path
    }

    pub fn id_segments(&self) -> &[usize] {
        &self.id_segments
    }

    pub fn typecast_segments(&self) -> &BTreeMap<usize, SegmentCast> {
        &self.typecast_segments
    }
}

/// Arena of route nodes in depth-first order
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl RouteTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes.iter()
    }

    pub fn node(&self, id: RouteNodeId) -> Result<&RouteNode> {
        self.nodes.get(id.0).ok_or_else(|| {
            GeneratorError::Generation(format!("dangling route node #{}", id.0))
        })
    }

    pub fn roots(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes.iter().filter(|n| n.is_root())
    }

    pub fn children(&self, id: RouteNodeId) -> impl Iterator<Item = &RouteNode> {
        self.nodes.iter().filter(move |n| n.parent == Some(id))
    }

    /// Ancestor ids, nearest first
    pub fn ancestors(&self, id: RouteNodeId) -> Result<Vec<RouteNodeId>> {
        let mut chain = Vec::new();
        let mut cursor = self.node(id)?.parent;
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.node(current)?.parent;
        }
        Ok(chain)
    }
}

/// A node waiting on the work stack
struct PendingNode {
    property: PropertyId,
    parent: Option<RouteNodeId>,
    cast: Option<SegmentCast>,
}

/// Builds the route tree of a schema graph
pub struct RouteBuilder<'a> {
    graph: &'a SchemaGraph,
    config: &'a GeneratorConfig,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a GeneratorConfig) -> Self {
        Self { graph, config }
    }

    /// Walk the graph from the entry container and return every route
    pub fn build(&self) -> Result<RouteTree> {
        let mut tree = RouteTree::default();

        let roots = self
            .graph
            .container()
            .properties
            .iter()
            .map(|&property| PendingNode {
                property,
                parent: None,
                cast: None,
            })
            .collect();
        let mut stack = self.stack_order(roots)?;

        while let Some(pending) = stack.pop() {
            let Some(id) = self.admit(&mut tree, pending)? else {
                continue;
            };
            let children = self.children(&tree, id)?;
            stack.extend(self.stack_order(children)?);
        }

        debug!(routes = tree.len(), "built route tree");
        Ok(tree)
    }

    /// Sort by property name, descending, so the stack pops in ascending order;
    /// same-named entries pop in the order they were given
    fn stack_order(&self, pending: Vec<PendingNode>) -> Result<Vec<PendingNode>> {
        let mut named = pending
            .into_iter()
            .map(|p| Ok((self.graph.property(p.property)?.name.clone(), p)))
            .collect::<Result<Vec<_>>>()?;
        named.reverse();
        named.sort_by(|(a, _), (b, _)| b.cmp(a));
        Ok(named.into_iter().map(|(_, p)| p).collect())
    }

    /// Create the node for a pending entry, unless the route is excluded
    fn admit(&self, tree: &mut RouteTree, pending: PendingNode) -> Result<Option<RouteNodeId>> {
        let mut reversed = vec![(pending.property, pending.cast)];
        let mut cursor = pending.parent;
        while let Some(parent) = cursor {
            let node = tree.node(parent)?;
            reversed.push((node.property, node.cast));
            cursor = node.parent;
        }
        reversed.reverse();

        let mut names = Vec::with_capacity(reversed.len());
        for (property, _) in &reversed {
            names.push(self.graph.property(*property)?.name.as_str());
        }
        let file_path = names.join("/");
        if self.config.is_route_excluded(&file_path) {
            debug!(route = %file_path, "route excluded by configuration");
            return Ok(None);
        }

        let mut id_segments = Vec::new();
        let mut typecast_segments = BTreeMap::new();
        for (index, (property_id, cast)) in reversed.iter().enumerate() {
            let property = self.graph.property(*property_id)?;
            if let TypeRef::Class(class) = property.type_ref {
                let is_entity = self.graph.class(class)?.is_entity();
                if property.is_collection && is_entity {
                    if self.graph.key_property(class)?.is_none() {
                        return Err(GeneratorError::schema(
                            self.graph.canonical_name(*property_id)?,
                            format!(
                                "collection of entity type '{}' has no key property",
                                self.graph.class(class)?.name
                            ),
                        ));
                    }
                    id_segments.push(index);
                }
            }
            if let Some(cast) = cast {
                // The cast applies to the segment before the one that needs it
                typecast_segments.insert(index - 1, *cast);
            }
        }

        let id = RouteNodeId(tree.nodes.len());
        let path = reversed.into_iter().map(|(property, _)| property).collect();
        tree.nodes.push(RouteNode {
            id,
            property: pending.property,
            parent: pending.parent,
            cast: pending.cast,
            path,
            id_segments,
            typecast_segments,
        });
        trace!(route = %file_path, "admitted route");
        Ok(Some(id))
    }

    /// Navigation children of a node that do not close a cycle
    fn children(&self, tree: &RouteTree, id: RouteNodeId) -> Result<Vec<PendingNode>> {
        let node = tree.node(id)?;
        let property = self.graph.property(node.property)?;
        let TypeRef::Class(class) = property.type_ref else {
            return Ok(Vec::new());
        };
        if let Some(max_depth) = self.config.max_route_depth {
            if node.depth() >= max_depth {
                return Ok(Vec::new());
            }
        }

        let ancestors: HashSet<PropertyId> = node.path.iter().copied().collect();
        let candidates = self.navigation_candidates(class)?;

        // Derived-type navigation names declared by more than one cast type
        let mut casts_by_name: HashMap<&str, HashSet<ClassId>> = HashMap::new();
        for (candidate, cast) in &candidates {
            if let Some(cast) = cast {
                let name = self.graph.property(*candidate)?.name.as_str();
                casts_by_name.entry(name).or_default().insert(*cast);
            }
        }

        let mut children = Vec::new();
        for (candidate, cast) in candidates {
            if ancestors.contains(&candidate) {
                trace!(
                    property = %self.graph.canonical_name(candidate)?,
                    "skipping property already on the route"
                );
                continue;
            }
            let name = self.graph.property(candidate)?.name.as_str();
            let cast = cast.map(|class| SegmentCast {
                class,
                by_type: casts_by_name.get(name).is_some_and(|c| c.len() > 1),
            });
            children.push(PendingNode {
                property: candidate,
                parent: Some(id),
                cast,
            });
        }

        Ok(children)
    }

    /// Entity-typed properties reachable from a class: its own and inherited
    /// ones first, then those declared on derived classes, nearest first
    fn navigation_candidates(&self, class: ClassId) -> Result<Vec<(PropertyId, Option<ClassId>)>> {
        let mut candidates = Vec::new();
        for property in self.graph.all_properties(class)? {
            if self.is_navigation(property)? {
                candidates.push((property, None));
            }
        }

        let mut queue: VecDeque<ClassId> = self.graph.derived_types(class)?.iter().copied().collect();
        let mut visited = HashSet::new();
        while let Some(derived) = queue.pop_front() {
            if !visited.insert(derived) {
                continue;
            }
            let derived_class = self.graph.class(derived)?;
            for &property in &derived_class.properties {
                if self.is_navigation(property)? {
                    candidates.push((property, Some(derived)));
                }
            }
            queue.extend(derived_class.derived.iter().copied());
        }

        Ok(candidates)
    }

    fn is_navigation(&self, property: PropertyId) -> Result<bool> {
        self.graph.is_entity_type(self.graph.property(property)?.type_ref)
    }
}

/// Build the route tree of a schema graph
pub fn build_routes(graph: &SchemaGraph, config: &GeneratorConfig) -> Result<RouteTree> {
    RouteBuilder::new(graph, config).build()
}

/// Placeholder for the identifier of an entity in a collection segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPlaceholder {
    pub name: String,
    /// Key property name on the wire
    pub key_name: String,
    pub key_type: ParameterType,
}

/// Placeholder for the derived type a segment is cast to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypecastPlaceholder {
    pub name: String,
    pub cast_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub name: String,
    pub id: Option<IdPlaceholder>,
    pub typecast: Option<TypecastPlaceholder>,
}

/// How the terminal identifier placeholder is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalId {
    /// Address the collection itself
    Omit,
    /// `{BookId}`
    Mandatory,
    /// `{BookId ?? ""}`: addresses an item when given, the collection otherwise
    Optional,
}

/// A route node rendered to segment and placeholder names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
}

impl Route {
    /// Render a node, naming its placeholders
    pub fn from_node(graph: &SchemaGraph, config: &GeneratorConfig, node: &RouteNode) -> Result<Self> {
        let mut taken: HashSet<String> = HashSet::new();
        let mut segments = Vec::with_capacity(node.path.len());

        for (index, &property_id) in node.path.iter().enumerate() {
            let property = graph.property(property_id)?;
            let stem = to_pascal_case(&singularize(&property.name));

            let id = if node.id_segments.contains(&index) {
                let TypeRef::Class(class) = property.type_ref else {
                    return Err(GeneratorError::schema(
                        graph.canonical_name(property_id)?,
                        "identifier segment is not class-typed",
                    ));
                };
                let Some(key_id) = graph.key_property(class)? else {
                    return Err(GeneratorError::schema(
                        graph.canonical_name(property_id)?,
                        "missing key property",
                    ));
                };
                let key = graph.property(key_id)?;
                let name = unique_name(&format!("{}{}", stem, config.id_parameter_suffix), |n| {
                    taken.contains(n)
                });
                taken.insert(name.clone());
                Some(IdPlaceholder {
                    name,
                    key_name: key.name.clone(),
                    key_type: to_parameter_type(graph, key.type_ref, false)?,
                })
            } else {
                None
            };

            let typecast = match node.typecast_segments.get(&index) {
                Some(cast) => {
                    let cast_stem = if cast.by_type {
                        to_pascal_case(&graph.class(cast.class)?.name)
                    } else {
                        stem.clone()
                    };
                    let name = unique_name(
                        &format!("{}{}", cast_stem, config.typecast_parameter_suffix),
                        |n| taken.contains(n),
                    );
                    taken.insert(name.clone());
                    Some(TypecastPlaceholder {
                        name,
                        cast_type: graph.qualified_name(cast.class)?,
                    })
                }
                None => None,
            };

            segments.push(RouteSegment {
                name: property.name.clone(),
                id,
                typecast,
            });
        }

        Ok(Self { segments })
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn terminal(&self) -> Option<&RouteSegment> {
        self.segments.last()
    }

    pub fn terminal_id(&self) -> Option<&IdPlaceholder> {
        self.terminal().and_then(|s| s.id.as_ref())
    }

    /// Segment index -> identifier placeholder name
    pub fn id_parameters(&self) -> BTreeMap<usize, &str> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.id.as_ref().map(|id| (i, id.name.as_str())))
            .collect()
    }

    /// Segment index -> typecast placeholder name
    pub fn typecast_parameters(&self) -> BTreeMap<usize, &str> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.typecast.as_ref().map(|t| (i, t.name.as_str())))
            .collect()
    }

    /// Route with placeholders, e.g. `books/{BookId}/authors`
    pub fn to_route_string(&self, include_terminal_id: bool) -> String {
        if include_terminal_id {
            self.to_url_template(TerminalId::Mandatory)
        } else {
            self.to_url_template(TerminalId::Omit)
        }
    }

    /// Call URL template relative to the service root
    pub fn to_url_template(&self, terminal: TerminalId) -> String {
        let last = self.segments.len().saturating_sub(1);
        let mut parts = Vec::new();

        for (index, segment) in self.segments.iter().enumerate() {
            parts.push(segment.name.clone());
            if let Some(id) = &segment.id {
                match (index == last, terminal) {
                    (false, _) | (true, TerminalId::Mandatory) => {
                        parts.push(format!("{{{}}}", id.name));
                    }
                    (true, TerminalId::Optional) => {
                        parts.push(format!("{{{} ?? \"\"}}", id.name));
                    }
                    (true, TerminalId::Omit) => {}
                }
            }
            if let Some(typecast) = &segment.typecast {
                parts.push(format!("{{{}}}", typecast.name));
            }
        }

        parts.join("/")
    }

    /// Segment names only, e.g. `books/authors`
    pub fn to_file_path_string(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// PascalCase segment names, e.g. `BooksAuthors`
    pub fn noun(&self) -> String {
        self.segments.iter().map(|s| to_pascal_case(&s.name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_cmdgen_common::{ClassKind, PrimitiveType, SchemaClass, SchemaProperty};

    fn string() -> TypeRef {
        TypeRef::Primitive(PrimitiveType::String)
    }

    fn keyed(graph: &mut SchemaGraph, name: &str) -> ClassId {
        let mut class = SchemaClass::new(name, ClassKind::Entity);
        class.key = Some("id".to_string());
        let id = graph.add_class(class).unwrap();
        graph.add_property(id, SchemaProperty::new("id", string())).unwrap();
        id
    }

    fn navigation(graph: &mut SchemaGraph, owner: ClassId, name: &str, target: ClassId) {
        let mut property = SchemaProperty::new(name, TypeRef::Class(target));
        property.is_collection = true;
        graph.add_property(owner, property).unwrap();
    }

    fn entity_set(graph: &mut SchemaGraph, name: &str, target: ClassId) {
        let mut property = SchemaProperty::new(name, TypeRef::Class(target));
        property.is_collection = true;
        graph.add_container_property(property).unwrap();
    }

    fn rendered(graph: &SchemaGraph, config: &GeneratorConfig) -> Vec<String> {
        let tree = build_routes(graph, config).unwrap();
        tree.iter()
            .map(|n| Route::from_node(graph, config, n).unwrap().to_route_string(true))
            .collect()
    }

    #[test]
    fn test_depth_first_alphabetical_order() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        let author = keyed(&mut graph, "Author");
        let chapter = keyed(&mut graph, "Chapter");
        navigation(&mut graph, book, "chapters", chapter);
        navigation(&mut graph, book, "authors", author);
        entity_set(&mut graph, "books", book);
        entity_set(&mut graph, "authors", author);

        let config = GeneratorConfig::default();
        assert_eq!(
            rendered(&graph, &config),
            vec![
                "authors/{AuthorId}",
                "books/{BookId}",
                "books/{BookId}/authors/{AuthorId}",
                "books/{BookId}/chapters/{ChapterId}",
            ]
        );
    }

    #[test]
    fn test_self_reference_expands_once() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let chapter = keyed(&mut graph, "Chapter");
        navigation(&mut graph, chapter, "subChapters", chapter);
        entity_set(&mut graph, "chapters", chapter);

        let config = GeneratorConfig::default();
        assert_eq!(
            rendered(&graph, &config),
            vec!["chapters/{ChapterId}", "chapters/{ChapterId}/subChapters/{SubChapterId}"]
        );
    }

    #[test]
    fn test_derived_navigation_needs_typecast() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        let audio = graph
            .add_class(SchemaClass::new("AudioBook", ClassKind::Entity))
            .unwrap();
        graph.set_base(audio, book).unwrap();
        let narrator = keyed(&mut graph, "Narrator");
        navigation(&mut graph, audio, "narrators", narrator);
        entity_set(&mut graph, "books", book);

        let config = GeneratorConfig::default();
        let tree = build_routes(&graph, &config).unwrap();
        let node = tree.iter().find(|n| n.depth() == 2).unwrap();
        assert_eq!(node.cast(), Some(audio));

        let route = Route::from_node(&graph, &config, node).unwrap();
        assert_eq!(
            route.to_route_string(false),
            "books/{BookId}/{BookTypeCast}/narrators"
        );
        assert_eq!(route.segments[0].typecast.as_ref().unwrap().cast_type, "library.AudioBook");
        assert_eq!(route.to_file_path_string(), "books/narrators");
        assert_eq!(
            route.id_parameters(),
            BTreeMap::from([(0, "BookId"), (1, "NarratorId")])
        );
        assert_eq!(route.typecast_parameters(), BTreeMap::from([(0, "BookTypeCast")]));
    }

    #[test]
    fn test_sibling_derived_navigations_are_both_routed() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        let audio = graph
            .add_class(SchemaClass::new("AudioBook", ClassKind::Entity))
            .unwrap();
        graph.set_base(audio, book).unwrap();
        let ebook = graph
            .add_class(SchemaClass::new("EBook", ClassKind::Entity))
            .unwrap();
        graph.set_base(ebook, book).unwrap();
        let narrator = keyed(&mut graph, "Narrator");
        let reader = keyed(&mut graph, "Reader");
        navigation(&mut graph, audio, "contributors", narrator);
        navigation(&mut graph, ebook, "contributors", reader);
        entity_set(&mut graph, "books", book);

        let config = GeneratorConfig::default();
        assert_eq!(
            rendered(&graph, &config),
            vec![
                "books/{BookId}",
                "books/{BookId}/{AudioBookTypeCast}/contributors/{ContributorId}",
                "books/{BookId}/{EBookTypeCast}/contributors/{ContributorId}",
            ]
        );

        let tree = build_routes(&graph, &config).unwrap();
        let casts: Vec<Option<ClassId>> = tree.iter().map(|n| n.cast()).collect();
        assert_eq!(casts, vec![None, Some(audio), Some(ebook)]);
        let route = Route::from_node(&graph, &config, &tree.nodes()[2]).unwrap();
        assert_eq!(route.segments[0].typecast.as_ref().unwrap().cast_type, "library.EBook");
    }

    #[test]
    fn test_property_on_path_is_not_revisited() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let author = keyed(&mut graph, "Author");
        let book = keyed(&mut graph, "Book");
        navigation(&mut graph, author, "books", book);
        navigation(&mut graph, book, "writers", author);
        entity_set(&mut graph, "authors", author);

        let config = GeneratorConfig::default();
        assert_eq!(
            rendered(&graph, &config),
            vec![
                "authors/{AuthorId}",
                "authors/{AuthorId}/books/{BookId}",
                "authors/{AuthorId}/books/{BookId}/writers/{WriterId}",
            ]
        );
    }

    #[test]
    fn test_optional_terminal_id() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        entity_set(&mut graph, "books", book);

        let config = GeneratorConfig::default();
        let tree = build_routes(&graph, &config).unwrap();
        let route = Route::from_node(&graph, &config, &tree.nodes()[0]).unwrap();
        assert_eq!(route.to_url_template(TerminalId::Optional), "books/{BookId ?? \"\"}");
        assert_eq!(route.to_url_template(TerminalId::Omit), "books");
        assert_eq!(route.noun(), "Books");
    }

    #[test]
    fn test_placeholder_names_are_unique() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let folder = keyed(&mut graph, "Folder");
        let item = keyed(&mut graph, "Item");
        navigation(&mut graph, folder, "item", item);
        let mut items = SchemaProperty::new("items", TypeRef::Class(folder));
        items.is_collection = true;
        graph.add_container_property(items).unwrap();

        let config = GeneratorConfig::default();
        let routes = rendered(&graph, &config);
        assert_eq!(routes[1], "items/{ItemId}/item/{ItemId1}");
    }

    #[test]
    fn test_max_depth_and_exclusions() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        let author = keyed(&mut graph, "Author");
        navigation(&mut graph, book, "authors", author);
        entity_set(&mut graph, "books", book);
        entity_set(&mut graph, "authors", author);

        let shallow = GeneratorConfig {
            max_route_depth: Some(1),
            ..Default::default()
        };
        assert_eq!(rendered(&graph, &shallow).len(), 2);

        let excluded = GeneratorConfig {
            exclude_routes: vec!["books".to_string()],
            ..Default::default()
        };
        assert_eq!(rendered(&graph, &excluded), vec!["authors/{AuthorId}"]);
    }

    #[test]
    fn test_collection_without_key_is_fatal() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let shelf = graph
            .add_class(SchemaClass::new("Shelf", ClassKind::Entity))
            .unwrap();
        entity_set(&mut graph, "shelves", shelf);

        let result = build_routes(&graph, &GeneratorConfig::default());
        assert!(matches!(result, Err(GeneratorError::Schema { .. })));
    }

    #[test]
    fn test_tree_navigation() {
        let mut graph = SchemaGraph::new("library", "LibraryService");
        let book = keyed(&mut graph, "Book");
        let author = keyed(&mut graph, "Author");
        navigation(&mut graph, book, "authors", author);
        entity_set(&mut graph, "books", book);

        let tree = build_routes(&graph, &GeneratorConfig::default()).unwrap();
        let root = tree.roots().next().unwrap().id();
        let child = tree.children(root).next().unwrap();
        assert_eq!(tree.ancestors(child.id()).unwrap(), vec![root]);
    }
}
