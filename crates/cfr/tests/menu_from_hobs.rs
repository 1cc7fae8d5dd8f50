//! From a HOB list to a materialized menu and back through config access.

use cfr::cfr_menu::encode_variable_name;
use cfr::cfr_types::hob::{encode_end_of_list, encode_guid_hob};
use cfr::{
    CfrBuilder, CfrError, CfrTree, ConfigAccess, Guid, HobList, MemoryStore, MenuConfig,
    MenuContext, MenuElement, OptionBuilder, OptionFlags, VariableStore, Walker, build_menu,
    find_default,
};

const CFR_GUID: Guid = Guid::from_fields(
    0xd9f6_9a45,
    0x7b3c,
    0x4d1e,
    [0x8a, 0x2f, 0x11, 0x5e, 0x60, 0x3c, 0x9b, 0x04],
);
const OTHER_GUID: Guid = Guid::from_fields(0x1234_5678, 0, 0, [0; 8]);

fn hob_list() -> Vec<u8> {
    let main = CfrBuilder::form("Main")
        .option(
            OptionBuilder::enumeration("BootMode", "Boot mode", 1)
                .object_id(1)
                .help("Firmware boot path")
                .value(0, "Legacy")
                .value(1, "UEFI"),
        )
        .option(OptionBuilder::boolean("Wifi", "Wireless", true).object_id(2))
        .subform(
            CfrBuilder::form("Details")
                .object_id(3)
                .option(OptionBuilder::varchar("Owner", "Owner tag", "lab-7").object_id(4))
                .option(OptionBuilder::comment("Settings apply on reboot")),
        )
        .build();
    let locked = CfrBuilder::form("Locked")
        .option(
            OptionBuilder::number("Serial", "Serial", 42)
                .object_id(5)
                .flags(OptionFlags::READONLY),
        )
        .build();

    let mut list = Vec::new();
    list.extend(encode_guid_hob(CFR_GUID, &main).expect("Main fits a HOB"));
    list.extend(encode_guid_hob(OTHER_GUID, b"unrelated").expect("fits"));
    list.extend(encode_guid_hob(CFR_GUID, &locked).expect("Locked fits a HOB"));
    list.extend(encode_end_of_list());
    list
}

fn request(name: &str) -> String {
    format!("GUID=00&NAME={}&PATH=00&OFFSET=0&WIDTH=4", encode_variable_name(name))
}

#[test]
fn hob_list_to_menu() {
    let list = hob_list();
    let hobs = HobList::new(&list);
    let trees = CfrTree::from_hob_list(&hobs, CFR_GUID);
    assert_eq!(
        trees.iter().map(CfrTree::name).collect::<Vec<_>>(),
        ["Main", "Locked"]
    );

    let store = MemoryStore::new();
    let config = MenuConfig::default();
    let ctx = MenuContext::new(&store, &config).with_policy(&store);
    let menu = build_menu(ctx, &Walker::default(), &trees);

    assert!(menu.is_clean(), "{:?}", menu.report.diagnostics);
    assert_eq!(menu.provisioned, ["BootMode", "Wifi", "Owner", "Serial"]);
    assert!(store.is_locked("Serial"));
    assert!(!store.is_locked("BootMode"));

    let ids: Vec<u16> = menu
        .elements
        .iter()
        .filter_map(|element| element.question().map(|question| question.id))
        .collect();
    assert_eq!(ids, [0x1001, 0x1002, 0x1004, 0x1005]);

    let one_of = menu
        .elements
        .iter()
        .find(|element| matches!(element, MenuElement::OneOf { .. }))
        .expect("BootMode element");
    let MenuElement::OneOf { default, options, .. } = one_of else {
        unreachable!()
    };
    assert_eq!(*default, 1);
    assert_eq!(options.len(), 2);

    // both trees end with a blank separator
    let separators = menu
        .elements
        .iter()
        .filter(|element| matches!(element, MenuElement::Subtitle { label, .. } if label.is_empty()))
        .count();
    assert_eq!(separators, 2);

    let owner = find_default(&trees, Some("Main"), "Owner").expect("Owner default");
    assert_eq!(owner.as_text(), Some("lab-7"));
}

#[test]
fn config_access_round_trip() {
    let list = hob_list();
    let hobs = HobList::new(&list);
    let trees = CfrTree::from_hob_list(&hobs, CFR_GUID);
    let store = MemoryStore::new();
    let config = MenuConfig::default();
    let ctx = MenuContext::new(&store, &config).with_policy(&store);
    let menu = build_menu(ctx, &Walker::default(), &trees);
    assert!(menu.is_clean());

    let access = ConfigAccess::new(&store);
    assert_eq!(
        access.extract_config(&request("BootMode")).expect("stored"),
        1_u32.to_le_bytes()
    );

    access
        .route_config(&request("BootMode"), &0_u32.to_le_bytes())
        .expect("writable");
    assert_eq!(store.get_exact("BootMode", 4).expect("stored"), [0, 0, 0, 0]);

    // locked variables keep their value but the write still succeeds
    access
        .route_config(&request("Serial"), &7_u32.to_le_bytes())
        .expect("locked write is accepted");
    assert_eq!(store.get_exact("Serial", 4).expect("stored"), 42_u32.to_le_bytes());

    let err = access
        .route_config(&request("BootMode"), &[1])
        .expect_err("size must match");
    assert!(matches!(err, CfrError::StoreSizeMismatch { expected: 4, actual: 1, .. }));
}

#[test]
fn rebuilding_keeps_user_choices() {
    let list = hob_list();
    let hobs = HobList::new(&list);
    let trees = CfrTree::from_hob_list(&hobs, CFR_GUID);
    let store = MemoryStore::new();
    let config = MenuConfig::default();

    let first = build_menu(MenuContext::new(&store, &config), &Walker::default(), &trees);
    assert_eq!(first.provisioned.len(), 4);
    ConfigAccess::new(&store)
        .route_config(&request("Wifi"), &0_u32.to_le_bytes())
        .expect("writable");

    let second = build_menu(MenuContext::new(&store, &config), &Walker::default(), &trees);
    assert!(second.provisioned.is_empty());
    assert_eq!(store.get_exact("Wifi", 4).expect("stored"), [0, 0, 0, 0]);
    assert_eq!(first.elements.len(), second.elements.len());
}
