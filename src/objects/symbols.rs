use std::collections::HashMap;

/// Name → value map backing script variables. One per object, plus a single
/// process-wide table for `$_name` globals.
#[derive(Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, f32>,
}

impl SymbolTable {
    pub fn set(&mut self, name: &str, value: f32) {
        self.entries.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> f32 {
        self.entries.get(name).copied().unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Variables whose name starts with `_` (script form `$_name`) live in the
/// global table; everything else is per-object.
pub fn is_global_name(name: &str) -> bool {
    name.starts_with('_')
}

pub fn read_var(name: &str, locals: &SymbolTable, globals: &SymbolTable) -> f32 {
    if is_global_name(name) {
        globals.get(name)
    } else {
        locals.get(name)
    }
}

pub fn write_var(name: &str, value: f32, locals: &mut SymbolTable, globals: &mut SymbolTable) {
    if is_global_name(name) {
        globals.set(name, value);
    } else {
        locals.set(name, value);
    }
}

/// Script-visible float arrays, addressed by numeric handles stored in
/// ordinary variables. Process-wide; `reset_globals` wipes them.
#[derive(Clone, Default)]
pub struct ArrayStore {
    arrays: HashMap<u32, Vec<f32>>,
    next_handle: u32,
}

impl ArrayStore {
    pub fn new_array(&mut self, len: usize) -> f32 {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.arrays.insert(handle, vec![0.0; len]);
        handle as f32
    }

    pub fn delete(&mut self, handle: f32) {
        self.arrays.remove(&(handle as u32));
    }

    pub fn resize(&mut self, handle: f32, len: usize) {
        if let Some(array) = self.arrays.get_mut(&(handle as u32)) {
            array.resize(len, 0.0);
        }
    }

    pub fn len(&self, handle: f32) -> f32 {
        self.arrays
            .get(&(handle as u32))
            .map(|a| a.len() as f32)
            .unwrap_or(0.0)
    }

    pub fn get(&self, handle: f32, index: f32) -> f32 {
        self.arrays
            .get(&(handle as u32))
            .and_then(|a| a.get(index as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, handle: f32, index: f32, value: f32) {
        if let Some(array) = self.arrays.get_mut(&(handle as u32)) {
            let index = index as usize;
            if index < array.len() {
                array[index] = value;
            }
        }
    }

    pub fn clone_array(&mut self, handle: f32) -> f32 {
        match self.arrays.get(&(handle as u32)).cloned() {
            Some(array) => {
                self.next_handle += 1;
                let new_handle = self.next_handle;
                self.arrays.insert(new_handle, array);
                new_handle as f32
            }
            None => 0.0,
        }
    }

    pub fn is_array(&self, handle: f32) -> bool {
        self.arrays.contains_key(&(handle as u32))
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
    }
}

/// Formats a value the way scripts expect to see it in text: whole numbers
/// lose the fraction, everything else uses the shortest float form.
pub fn format_value(value: f32) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Replaces `$name` and `$_name` tokens against the routed tables.
pub fn interpolate(template: &str, locals: &SymbolTable, globals: &SymbolTable) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push('$');
        } else {
            out.push_str(&format_value(read_var(&name, locals, globals)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_read_as_zero() {
        let table = SymbolTable::default();
        assert_eq!(table.get("i"), 0.0);
    }

    #[test]
    fn underscore_names_route_to_globals() {
        let mut locals = SymbolTable::default();
        let mut globals = SymbolTable::default();
        write_var("i", 1.0, &mut locals, &mut globals);
        write_var("_i", 2.0, &mut locals, &mut globals);
        assert_eq!(locals.get("i"), 1.0);
        assert_eq!(globals.get("_i"), 2.0);
        assert_eq!(read_var("_i", &locals, &globals), 2.0);
        assert!(globals.get("i") == 0.0);
    }

    #[test]
    fn interpolation_substitutes_and_trims() {
        let mut locals = SymbolTable::default();
        let globals = SymbolTable::default();
        locals.set("v", 3.5);
        locals.set("n", 4.0);
        assert_eq!(interpolate("x=$v", &locals, &globals), "x=3.5");
        assert_eq!(interpolate("n=$n!", &locals, &globals), "n=4!");
        assert_eq!(interpolate("$ alone", &locals, &globals), "$ alone");
    }

    #[test]
    fn arrays_round_trip() {
        let mut store = ArrayStore::default();
        let handle = store.new_array(3);
        assert!(store.is_array(handle));
        store.set(handle, 1.0, 7.5);
        assert_eq!(store.get(handle, 1.0), 7.5);
        assert_eq!(store.len(handle), 3.0);
        store.resize(handle, 5);
        assert_eq!(store.len(handle), 5.0);
        let copy = store.clone_array(handle);
        assert_eq!(store.get(copy, 1.0), 7.5);
        store.delete(handle);
        assert!(!store.is_array(handle));
        store.clear();
        assert!(!store.is_array(copy));
    }

    #[test]
    fn out_of_range_array_access_is_a_no_op() {
        let mut store = ArrayStore::default();
        let handle = store.new_array(2);
        store.set(handle, 9.0, 1.0);
        assert_eq!(store.get(handle, 9.0), 0.0);
    }
}
