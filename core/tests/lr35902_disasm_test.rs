use dotmatrix_core::cpu::lr35902::disasm;

fn disasm_bytes(bytes: &[u8]) -> (String, u16) {
    disasm::disassemble(0x0200, |addr| {
        bytes
            .get((addr - 0x0200) as usize)
            .copied()
            .unwrap_or(0x00)
    })
}

#[test]
fn test_plain_mnemonics() {
    assert_eq!(disasm_bytes(&[0x00]).0, "NOP");
    assert_eq!(disasm_bytes(&[0x76]).0, "HALT");
    assert_eq!(disasm_bytes(&[0xF3]).0, "DI");
    assert_eq!(disasm_bytes(&[0x87]).0, "ADD A,A");
}

#[test]
fn test_immediate_substitution() {
    let (text, len) = disasm_bytes(&[0x3E, 0x42]);
    assert_eq!(text, "LD A,42");
    assert_eq!(len, 2);

    let (text, len) = disasm_bytes(&[0xC3, 0x34, 0x12]);
    assert_eq!(text, "JP 1234");
    assert_eq!(len, 3);

    let (text, _) = disasm_bytes(&[0x08, 0xEF, 0xBE]);
    assert_eq!(text, "LD (BEEF),SP");
}

#[test]
fn test_high_page_forms() {
    assert_eq!(disasm_bytes(&[0xE0, 0x46]).0, "LDH (FF46),A");
    assert_eq!(disasm_bytes(&[0xF0, 0x44]).0, "LDH A,(FF44)");
}

#[test]
fn test_relative_targets_resolve() {
    // JR -2 at 0x0200 loops onto itself.
    assert_eq!(disasm_bytes(&[0x18, 0xFE]).0, "JR 0200");
    assert_eq!(disasm_bytes(&[0x20, 0x05]).0, "JR NZ,0207");
}

#[test]
fn test_cb_table() {
    let (text, len) = disasm_bytes(&[0xCB, 0x37]);
    assert_eq!(text, "SWAP A");
    assert_eq!(len, 2);
    assert_eq!(disasm_bytes(&[0xCB, 0x46]).0, "BIT 0,(HL)");
    assert_eq!(disasm_bytes(&[0xCB, 0xFE]).0, "SET 7,(HL)");
}

#[test]
fn test_undefined_opcodes_marked() {
    assert_eq!(disasm_bytes(&[0xD3]).0, "???");
    assert_eq!(disasm_bytes(&[0xED]).0, "???");
}

#[test]
fn test_every_opcode_has_a_mnemonic() {
    for op in 0u16..=0xFF {
        assert!(!disasm::MNEMONICS[op as usize].is_empty());
    }
}
