//! Opcode tables.
//!
//! Each instruction format owns its own table. A decoded opcode is looked up
//! in the table selected by the format; an opcode missing from that table is
//! a decode error.

macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, $mnemonic:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// All opcodes in this table.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Looks up a raw six-bit opcode in this table.
            pub fn from_opcode(opcode: u8) -> Option<Self> {
                match opcode {
                    $( $value => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Returns the raw six-bit opcode.
            pub fn opcode(self) -> u8 {
                self as u8
            }

            /// Returns the assembler mnemonic.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $( $name::$variant => $mnemonic, )+
                }
            }
        }
    };
}

opcode_table! {
    /// Format 0: register-to-register arithmetic and logic.
    ArithmeticOp {
        /// Copies the second register into the first.
        Mov = 0x04, "MOV";
        /// `dst = s1 + s2`.
        Add = 0x05, "ADD";
        /// `dst = s1 - s2`.
        Sub = 0x06, "SUB";
        /// `dst = s1 * s2`.
        Mul = 0x07, "MUL";
        /// `dst = floor(s1 / s2)`.
        Div = 0x08, "DIV";
        /// `dst = s1 & s2`.
        And = 0x09, "AND";
        /// `dst = s1 | s2`.
        Or = 0x0A, "OR";
        /// `dst = 1` if `s1 < s2`, else `0`.
        Slt = 0x10, "SLT";
    }
}

opcode_table! {
    /// Format 1: conditional branches, immediates, loads and stores.
    BranchOp {
        /// Stores the B-register at the address held in the D-register.
        St = 0x02, "ST";
        /// Reads the word at the address held in the B-register.
        Lw = 0x03, "LW";
        /// Moves the immediate into the D-register.
        Movi = 0x0B, "MOVI";
        /// Adds the immediate to the D-register.
        Addi = 0x0C, "ADDI";
        /// Multiplies the D-register by the immediate.
        Muli = 0x0D, "MULI";
        /// Floor-divides the D-register by the immediate.
        Divi = 0x0E, "DIVI";
        /// Loads the immediate into the D-register.
        Ldi = 0x0F, "LDI";
        /// `dst = 1` if the B-register is less than the immediate, else `0`.
        Slti = 0x11, "SLTI";
        /// Branches when B-register == D-register.
        Beq = 0x15, "BEQ";
        /// Branches when B-register != D-register.
        Bne = 0x16, "BNE";
        /// Branches when B-register == 0.
        Bez = 0x17, "BEZ";
        /// Branches when B-register != 0.
        Bnz = 0x18, "BNZ";
        /// Branches when B-register > 0.
        Bgz = 0x19, "BGZ";
        /// Branches when B-register < 0.
        Blz = 0x1A, "BLZ";
    }
}

opcode_table! {
    /// Format 2: unconditional control transfer.
    JumpOp {
        /// Logical end of program.
        Hlt = 0x12, "HLT";
        /// Jumps to an absolute instruction address.
        Jmp = 0x14, "JMP";
    }
}

opcode_table! {
    /// Format 3: input and output buffer transfers.
    IoOp {
        /// Reads a word into a register.
        Rd = 0x00, "RD";
        /// Writes a register out to memory.
        Wr = 0x01, "WR";
    }
}
