use std::fmt;

const GROUPS: [&str; 3] = ["xyzw", "rgba", "stpq"];

/// Vector component selection such as `.zyx`, as 0-based component indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Swizzle {
    pub len: u32,
    pub index: [u32; 4],
}

impl Swizzle {
    /// Parses `field` as a swizzle over a vector of `rows` components.
    pub fn parse(field: &str, rows: u32) -> Option<Swizzle> {
        let len = field.chars().count();
        if !(1..=4).contains(&len) {
            return None;
        }
        let first = field.chars().next()?;
        let group = GROUPS.iter().find(|g| g.contains(first))?;

        let mut swz = Swizzle {
            len: len as u32,
            index: [0; 4],
        };
        for (slot, c) in swz.index.iter_mut().zip(field.chars()) {
            let i = group.find(c)? as u32;
            if i >= rows {
                return None;
            }
            *slot = i;
        }
        Some(swz)
    }

    /// Assignable: no longer than the vector and no component named twice.
    pub fn is_mask(&self, rows: u32) -> bool {
        let used = self.indices();
        self.len <= rows
            && used
                .iter()
                .enumerate()
                .all(|(i, x)| !used[..i].contains(x))
    }

    pub fn indices(&self) -> &[u32] {
        &self.index[..self.len as usize]
    }

    /// Applies `next` to a vector that was already swizzled by `self`.
    pub fn compose(&self, next: &Swizzle) -> Swizzle {
        let mut out = *next;
        for (slot, i) in out.index.iter_mut().zip(next.indices()) {
            *slot = self.index[*i as usize];
        }
        out
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = GROUPS[0].as_bytes();
        for &i in self.indices() {
            write!(f, "{}", letters[i as usize] as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_strings(max: usize) -> Vec<String> {
        let alphabet: Vec<char> = GROUPS.concat().chars().collect();
        let mut out = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max {
            frontier = frontier
                .iter()
                .flat_map(|s| alphabet.iter().map(move |c| format!("{s}{c}")))
                .collect();
            out.extend(frontier.iter().cloned());
        }
        out
    }

    #[test]
    fn accepts_single_group_in_range() {
        assert_eq!(Swizzle::parse("zyx", 3).map(|s| s.to_string()), Some("zyx".into()));
        assert_eq!(Swizzle::parse("bgr", 4).map(|s| s.to_string()), Some("zyx".into()));
        assert_eq!(Swizzle::parse("ts", 2).map(|s| s.to_string()), Some("yx".into()));
        assert!(Swizzle::parse("xg", 4).is_none());
        assert!(Swizzle::parse("z", 2).is_none());
        assert!(Swizzle::parse("", 4).is_none());
        assert!(Swizzle::parse("xyzwx", 4).is_none());
        assert!(Swizzle::parse("foo", 4).is_none());
    }

    #[test]
    fn mask_implies_swizzle() {
        for rows in 2..=4 {
            for s in all_strings(3) {
                let groups = GROUPS.iter().filter(|g| s.chars().any(|c| g.contains(c))).count();
                let in_range = GROUPS
                    .iter()
                    .all(|g| s.chars().all(|c| g.find(c).map_or(true, |i| (i as u32) < rows)));
                let parsed = Swizzle::parse(&s, rows);
                assert_eq!(parsed.is_some(), !s.is_empty() && groups == 1 && in_range, "{s}");
                if let Some(swz) = parsed {
                    let unique = swz.indices().iter().collect::<std::collections::HashSet<_>>();
                    assert_eq!(swz.is_mask(rows), unique.len() == s.len(), "{s}");
                }
            }
        }
        let xx = Swizzle::parse("xx", 4).unwrap_or_default();
        assert_eq!(xx.len, 2);
        assert!(!xx.is_mask(4));
    }

    #[test]
    fn composition_matches_direct_indexing() {
        let outer = Swizzle::parse("wzyx", 4).unwrap_or_default();
        let inner = Swizzle::parse("yx", 4).unwrap_or_default();
        let composed = outer.compose(&inner);
        assert_eq!(composed.to_string(), "zw");
        assert_eq!(composed, Swizzle::parse("zw", 4).unwrap_or_default());

        for s in all_strings(2).into_iter().filter(|s| !s.is_empty()) {
            let (Some(a), Some(b)) = (Swizzle::parse("ywxz", 4), Swizzle::parse(&s, 4)) else {
                continue;
            };
            let direct: Vec<u32> = b.indices().iter().map(|&i| a.index[i as usize]).collect();
            assert_eq!(a.compose(&b).indices(), direct.as_slice());
        }
    }
}
