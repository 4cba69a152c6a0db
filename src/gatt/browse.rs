use crate::uuid::Uuid;

use super::*;

/// One service instance returned by a GATT browse, with its
/// characteristics and descriptors in declaration order.
#[derive(Clone, Debug)]
pub struct ServiceDef {
    /// Service UUID.
    pub uuid: Uuid,
    /// Characteristic and descriptor declarations, in handle order.
    pub items: Vec<BrowseItem>,
}

/// One attribute within a browsed service.
#[derive(Clone, Copy, Debug)]
pub enum BrowseItem {
    /// Characteristic declaration.
    Characteristic(CharacteristicDef),
    /// Descriptor following a characteristic declaration.
    Descriptor(DescriptorDef),
}

/// Browsed characteristic declaration.
#[derive(Clone, Copy, Debug)]
pub struct CharacteristicDef {
    /// Declaration handle.
    pub handle: Handle,
    /// Characteristic value handle.
    pub value_handle: Handle,
    /// Characteristic properties.
    pub props: CharProps,
    /// Characteristic UUID.
    pub uuid: Uuid,
}

/// Browsed descriptor declaration.
#[derive(Clone, Copy, Debug)]
pub struct DescriptorDef {
    /// Descriptor handle.
    pub handle: Handle,
    /// Descriptor UUID.
    pub uuid: Uuid,
}

/// Forward-scanning finder over the items of one browsed service.
///
/// [`characteristic`](Self::characteristic) resumes the scan after the
/// previously found characteristic, and
/// [`descriptor`](Self::descriptor) is scoped to the descriptors of the
/// most recently found characteristic.
#[derive(Debug)]
pub struct Finder<'a> {
    items: &'a [BrowseItem],
    /// Index of the item following the last characteristic match.
    next: usize,
    /// Index of the last characteristic match.
    last: Option<usize>,
}

impl<'a> Finder<'a> {
    /// Creates a finder over the service's items.
    #[inline]
    #[must_use]
    pub fn new(svc: &'a ServiceDef) -> Self {
        Self {
            items: &svc.items,
            next: 0,
            last: None,
        }
    }

    /// Returns the next characteristic with the specified UUID, continuing
    /// from the previous match.
    pub fn characteristic(&mut self, uuid: impl Into<Uuid>) -> Option<CharacteristicDef> {
        let uuid = uuid.into();
        for (i, it) in self.items.iter().enumerate().skip(self.next) {
            if let BrowseItem::Characteristic(c) = *it {
                if c.uuid == uuid {
                    self.last = Some(i);
                    self.next = i + 1;
                    return Some(c);
                }
            }
        }
        None
    }

    /// Returns the descriptor with the specified UUID belonging to the most
    /// recently found characteristic, or `None` if no characteristic was
    /// found yet or the descriptor is absent.
    pub fn descriptor(&mut self, uuid: impl Into<Uuid>) -> Option<DescriptorDef> {
        let uuid = uuid.into();
        let start = self.last? + 1;
        for it in self.items.get(start..)? {
            match *it {
                BrowseItem::Characteristic(_) => break,
                BrowseItem::Descriptor(d) if d.uuid == uuid => return Some(d),
                BrowseItem::Descriptor(_) => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::uuid::Uuid16;

    use super::*;

    fn hdl(h: u16) -> Handle {
        Handle::new(h).unwrap()
    }

    fn chr(h: u16, uuid: u16, props: CharProps) -> BrowseItem {
        BrowseItem::Characteristic(CharacteristicDef {
            handle: hdl(h),
            value_handle: hdl(h + 1),
            props,
            uuid: Uuid16::from_u16(uuid).as_uuid(),
        })
    }

    fn dsc(h: u16, uuid: u16) -> BrowseItem {
        BrowseItem::Descriptor(DescriptorDef {
            handle: hdl(h),
            uuid: Uuid16::from_u16(uuid).as_uuid(),
        })
    }

    fn svc() -> ServiceDef {
        ServiceDef {
            uuid: Uuid16::from_u16(0x180F).as_uuid(),
            items: vec![
                chr(2, 0x2A00, CharProps::READ),
                chr(4, 0x2A01, CharProps::NOTIFY),
                dsc(6, 0x2902),
                chr(7, 0x2A02, CharProps::WRITE),
            ],
        }
    }

    #[test]
    fn characteristic_scan() {
        let svc = svc();
        let mut f = Finder::new(&svc);
        let c = f.characteristic(Uuid16::from_u16(0x2A01)).unwrap();
        assert_eq!(c.value_handle, hdl(5));
        // Scan does not rewind
        assert!(f.characteristic(Uuid16::from_u16(0x2A00)).is_none());
        assert!(f.characteristic(Uuid16::from_u16(0x2A02)).is_some());
    }

    #[test]
    fn descriptor_scope() {
        let svc = svc();
        let mut f = Finder::new(&svc);
        // No characteristic found yet
        assert!(f.descriptor(CLIENT_CHAR_CFG).is_none());
        f.characteristic(Uuid16::from_u16(0x2A00)).unwrap();
        // 0x2A00 has no descriptors; the scan stops at the next
        // characteristic
        assert!(f.descriptor(CLIENT_CHAR_CFG).is_none());
        f.characteristic(Uuid16::from_u16(0x2A01)).unwrap();
        assert_eq!(f.descriptor(CLIENT_CHAR_CFG).unwrap().handle, hdl(6));
    }
}
