use hashbrown::HashMap;

use crate::models::{Address, AddressId, StreetId};

/// Known addresses grouped by street
pub struct AddressBook {
    by_street: HashMap<StreetId, Vec<Address>>,
    len: usize,
}

impl AddressBook {
    pub fn new(addresses: Vec<Address>) -> Self {
        let len = addresses.len();
        let mut by_street: HashMap<StreetId, Vec<Address>> = HashMap::new();
        for address in addresses {
            by_street.entry(address.street_id).or_default().push(address);
        }
        for list in by_street.values_mut() {
            list.sort_by_key(|a| a.id);
        }

        Self { by_street, len }
    }

    /// Active addresses on the given streets, in street order then id order
    pub fn on_streets<'a>(
        &'a self,
        streets: &'a [StreetId],
    ) -> impl Iterator<Item = &'a Address> + 'a {
        streets
            .iter()
            .filter_map(move |id| self.by_street.get(id))
            .flatten()
            .filter(|a| a.active)
    }

    pub fn get(&self, street_id: StreetId, id: AddressId) -> Option<&Address> {
        self.by_street.get(&street_id)?.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_streets_filters_inactive_and_keeps_order() {
        let mut gone = Address::new(AddressId(3), StreetId(1)).with_number("12");
        gone.active = false;
        let book = AddressBook::new(vec![
            Address::new(AddressId(2), StreetId(1)).with_number("10"),
            Address::new(AddressId(1), StreetId(1)).with_number("8"),
            Address::new(AddressId(5), StreetId(2)).with_number("4"),
            gone,
        ]);

        let ids: Vec<AddressId> = book
            .on_streets(&[StreetId(2), StreetId(1)])
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![AddressId(5), AddressId(1), AddressId(2)]);
        assert_eq!(book.len(), 4);
        assert!(book.get(StreetId(1), AddressId(3)).is_some());
    }
}
