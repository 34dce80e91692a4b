use crate::models::Memory;
use std::collections::HashMap;

/// All memories from one month of one year, in the order they were imported
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSection {
    pub month: String,
    pub memories: Vec<Memory>,
}

/// One year's worth of month sections, most recent month first
#[derive(Debug, Clone, PartialEq)]
pub struct YearSection {
    pub year: String,
    pub months: Vec<MonthSection>,
}

impl YearSection {
    pub fn memory_count(&self) -> usize {
        self.months.iter().map(|m| m.memories.len()).sum()
    }
}

/// Bucket memories by year, then month.
///
/// Years sort by descending string value, which is chronological for
/// four-digit years. Months sort by the date of their first member, descending.
/// Members keep their input order; no per-memory sort is applied.
pub fn build_sections(memories: &[Memory]) -> Vec<YearSection> {
    let mut sections: Vec<YearSection> = group_by(memories.iter(), Memory::year)
        .into_iter()
        .map(|(year, year_memories)| {
            let mut months: Vec<MonthSection> = group_by(year_memories.into_iter(), Memory::month)
                .into_iter()
                .map(|(month, month_memories)| MonthSection {
                    month,
                    memories: month_memories.into_iter().cloned().collect(),
                })
                .collect();

            months.sort_by(|a, b| representative_date(b).cmp(representative_date(a)));

            YearSection { year, months }
        })
        .collect();

    sections.sort_by(|a, b| b.year.cmp(&a.year));
    sections
}

/// Group items by key; each group keeps the relative order of the input
fn group_by<'a, I, F>(items: I, key_fn: F) -> HashMap<String, Vec<&'a Memory>>
where
    I: Iterator<Item = &'a Memory>,
    F: Fn(&Memory) -> String,
{
    let mut groups: HashMap<String, Vec<&'a Memory>> = HashMap::new();
    for memory in items {
        groups.entry(key_fn(memory)).or_default().push(memory);
    }
    groups
}

fn representative_date(section: &MonthSection) -> &str {
    section
        .memories
        .first()
        .map(|memory| memory.date.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(date: &str) -> Memory {
        Memory::new(date, "Image", "https://x/1")
    }

    #[test]
    fn test_years_sorted_descending() {
        let memories = vec![
            memory("2021-05-01 00:00:00 UTC"),
            memory("2024-01-01 00:00:00 UTC"),
            memory("2019-12-31 00:00:00 UTC"),
        ];

        let sections = build_sections(&memories);
        let years: Vec<&str> = sections.iter().map(|s| s.year.as_str()).collect();

        assert_eq!(years, vec!["2024", "2021", "2019"]);
    }

    #[test]
    fn test_months_sorted_by_representative_date() {
        let memories = vec![
            memory("2024-01-10 00:00:00 UTC"),
            memory("2024-11-02 00:00:00 UTC"),
            memory("2024-03-15 00:00:00 UTC"),
        ];

        let sections = build_sections(&memories);
        let months: Vec<&str> = sections[0]
            .months
            .iter()
            .map(|m| m.month.as_str())
            .collect();

        assert_eq!(months, vec!["November", "March", "January"]);
    }

    #[test]
    fn test_members_keep_input_order() {
        let memories = vec![
            memory("2024-03-01 00:00:00 UTC"),
            memory("2024-03-20 00:00:00 UTC"),
            memory("2024-03-10 00:00:00 UTC"),
        ];

        let sections = build_sections(&memories);
        let dates: Vec<&str> = sections[0].months[0]
            .memories
            .iter()
            .map(|m| m.date.as_str())
            .collect();

        assert_eq!(
            dates,
            vec![
                "2024-03-01 00:00:00 UTC",
                "2024-03-20 00:00:00 UTC",
                "2024-03-10 00:00:00 UTC",
            ]
        );
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let memories: Vec<Memory> = [
            "2022-02-02 00:00:00 UTC",
            "2023-02-02 00:00:00 UTC",
            "2023-07-04 00:00:00 UTC",
            "2023-07-05 00:00:00 UTC",
            "2024-13-01 00:00:00 UTC",
            "bad",
        ]
        .iter()
        .map(|d| memory(d))
        .collect();

        let sections = build_sections(&memories);

        let mut grouped_ids: Vec<_> = sections
            .iter()
            .flat_map(|y| y.months.iter())
            .flat_map(|m| m.memories.iter().map(|memory| memory.id))
            .collect();
        let mut input_ids: Vec<_> = memories.iter().map(|m| m.id).collect();
        grouped_ids.sort();
        input_ids.sort();

        assert_eq!(grouped_ids, input_ids);
        assert_eq!(
            sections.iter().map(YearSection::memory_count).sum::<usize>(),
            memories.len()
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(build_sections(&[]).is_empty());
    }
}
