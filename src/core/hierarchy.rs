use crate::domain::model::Espacio;
use std::collections::{HashMap, HashSet};

/// Read-only view of the space tree, indexed by id.
///
/// `espacio_superior_id` is only a back-reference; the view never owns the
/// records, so a malformed store (with a cycle) can still be walked safely.
pub struct Jerarquia<'a> {
    by_id: HashMap<&'a str, &'a Espacio>,
    children: HashMap<&'a str, Vec<&'a Espacio>>,
}

impl<'a> Jerarquia<'a> {
    pub fn new<I>(espacios: I) -> Self
    where
        I: IntoIterator<Item = &'a Espacio>,
    {
        let mut by_id = HashMap::new();
        let mut children: HashMap<&'a str, Vec<&'a Espacio>> = HashMap::new();
        for espacio in espacios {
            by_id.insert(espacio.id.as_str(), espacio);
            if let Some(superior) = espacio.espacio_superior_id.as_deref() {
                children.entry(superior).or_default().push(espacio);
            }
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| a.nombre.cmp(&b.nombre).then_with(|| a.id.cmp(&b.id)));
        }
        Self { by_id, children }
    }

    pub fn get(&self, id: &str) -> Option<&'a Espacio> {
        self.by_id.get(id).copied()
    }

    pub fn parent(&self, id: &str) -> Option<&'a Espacio> {
        let superior = self.get(id)?.espacio_superior_id.as_deref()?;
        self.get(superior)
    }

    pub fn children(&self, id: &str) -> &[&'a Espacio] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nearest ancestor first. Stops early if the chain loops back.
    pub fn ancestors(&self, id: &str) -> Vec<&'a Espacio> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut current = self.parent(id);
        while let Some(espacio) = current {
            if !seen.insert(espacio.id.as_str()) {
                break;
            }
            out.push(espacio);
            current = self.parent(&espacio.id);
        }
        out
    }

    pub fn depth(&self, id: &str) -> usize {
        self.ancestors(id).len()
    }

    /// Spaces without a (resolvable) superior.
    pub fn roots(&self) -> Vec<&'a Espacio> {
        let mut roots: Vec<&'a Espacio> = self
            .by_id
            .values()
            .copied()
            .filter(|e| match e.espacio_superior_id.as_deref() {
                Some(superior) => !self.by_id.contains_key(superior),
                None => true,
            })
            .collect();
        roots.sort_by(|a, b| a.nombre.cmp(&b.nombre).then_with(|| a.id.cmp(&b.id)));
        roots
    }

    /// True when pointing `id` at `superior_id` would make `id` its own
    /// ancestor, self-reference included.
    pub fn would_create_cycle(&self, id: &str, superior_id: &str) -> bool {
        if id == superior_id {
            return true;
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = Some(superior_id);
        while let Some(cursor) = current {
            if cursor == id {
                return true;
            }
            if !seen.insert(cursor) {
                return false;
            }
            current = self
                .get(cursor)
                .and_then(|e| e.espacio_superior_id.as_deref());
        }
        false
    }

    /// Indented outline of the forest, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut visited = HashSet::new();
        for root in self.roots() {
            self.render_node(root, 0, &mut visited, &mut out);
        }
        out
    }

    fn render_node(
        &self,
        espacio: &'a Espacio,
        level: usize,
        visited: &mut HashSet<&'a str>,
        out: &mut String,
    ) {
        if !visited.insert(espacio.id.as_str()) {
            return;
        }
        out.push_str(&format!(
            "{}{} [{}] ({}){}\n",
            "  ".repeat(level),
            espacio.nombre,
            espacio.tipo,
            espacio.id,
            if espacio.is_active() { "" } else { " - Inactivo" }
        ));
        for child in self.children(&espacio.id) {
            self.render_node(child, level + 1, visited, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NuevoEspacio;

    fn espacio(id: &str, tipo: &str, nombre: &str, superior: Option<&str>) -> Espacio {
        let mut nuevo = NuevoEspacio::new(tipo, nombre).with_id(id);
        if let Some(s) = superior {
            nuevo = nuevo.with_superior(s);
        }
        Espacio::create_now(nuevo).unwrap()
    }

    fn hospital() -> Vec<Espacio> {
        vec![
            espacio("edif", "Edificio", "Torre Norte", None),
            espacio("piso1", "Piso", "Piso 1", Some("edif")),
            espacio("hab101", "Habitación", "Habitación 101", Some("piso1")),
            espacio("cama1", "Cama", "Cama A", Some("hab101")),
            espacio("cama2", "Cama", "Cama B", Some("hab101")),
            espacio("estac", "Estacionamiento", "Estacionamiento", None),
        ]
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let espacios = hospital();
        let jerarquia = Jerarquia::new(&espacios);
        let ids: Vec<&str> = jerarquia
            .ancestors("cama1")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["hab101", "piso1", "edif"]);
        assert_eq!(jerarquia.depth("cama1"), 3);
        assert_eq!(jerarquia.depth("edif"), 0);
    }

    #[test]
    fn test_children_and_roots() {
        let espacios = hospital();
        let jerarquia = Jerarquia::new(&espacios);
        let camas: Vec<&str> = jerarquia
            .children("hab101")
            .iter()
            .map(|e| e.nombre.as_str())
            .collect();
        assert_eq!(camas, vec!["Cama A", "Cama B"]);

        let roots: Vec<&str> = jerarquia.roots().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(roots, vec!["estac", "edif"]);
        assert!(jerarquia.children("cama1").is_empty());
    }

    #[test]
    fn test_cycle_detection() {
        let espacios = hospital();
        let jerarquia = Jerarquia::new(&espacios);
        assert!(jerarquia.would_create_cycle("edif", "edif"));
        assert!(jerarquia.would_create_cycle("edif", "cama1"));
        assert!(jerarquia.would_create_cycle("piso1", "hab101"));
        assert!(!jerarquia.would_create_cycle("cama1", "estac"));
        assert!(!jerarquia.would_create_cycle("nuevo", "cama1"));
    }

    #[test]
    fn test_walks_terminate_on_existing_cycle() {
        let espacios = vec![
            espacio("a", "Piso", "A", Some("b")),
            espacio("b", "Piso", "B", Some("a")),
        ];
        let jerarquia = Jerarquia::new(&espacios);
        assert_eq!(jerarquia.ancestors("a").len(), 1);
        assert!(!jerarquia.would_create_cycle("c", "a"));
        assert!(jerarquia.roots().is_empty());
    }

    #[test]
    fn test_render_indents_by_level() {
        let espacios = hospital();
        let rendered = Jerarquia::new(&espacios).render();
        assert!(rendered.contains("Torre Norte [Edificio] (edif)\n"));
        assert!(rendered.contains("\n  Piso 1 [Piso] (piso1)\n"));
        assert!(rendered.contains("\n      Cama A [Cama] (cama1)\n"));
    }
}
