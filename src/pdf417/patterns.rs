/// Low 16 bits of the 17 module bar pattern of every codeword in clusters 0, 3
/// and 6. The leading bit is always a bar.
pub(super) const PATTERNS: [[u16; 929]; 3] = [
    [
        0xD5C0, 0xEAF0, 0xF57C, 0xD4E0, 0xEA78, 0xF53E, 0xA8C0, 0xD470, 0xA860, 0x5040, 0xA830, 0x5020,
        0xADC0, 0xD6F0, 0xEB7C, 0xACE0, 0xD678, 0xEB3E, 0x58C0, 0xAC70, 0x5860, 0x5DC0, 0xAEF0, 0xD77C,
        0x5CE0, 0xAE78, 0xD73E, 0x5C70, 0xAE3C, 0x5EF0, 0xAF7C, 0x5E78, 0xAF3E, 0x5F7C, 0xF5FA, 0xD2E0,
        0xE978, 0xF4BE, 0xA4C0, 0xD270, 0xE93C, 0xA460, 0xD238, 0x4840, 0xA430, 0xD21C, 0x4820, 0xA418,
        0x4810, 0xA6E0, 0xD378, 0xE9BE, 0x4CC0, 0xA670, 0xD33C, 0x4C60, 0xA638, 0xD31E, 0x4C30, 0xA61C,
        0x4EE0, 0xA778, 0xD3BE, 0x4E70, 0xA73C, 0x4E38, 0xA71E, 0x4F78, 0xA7BE, 0x4F3C, 0x4F1E, 0xA2C0,
        0xD170, 0xE8BC, 0xA260, 0xD138, 0xE89E, 0x4440, 0xA230, 0xD11C, 0x4420, 0xA218, 0x4410, 0x4408,
        0x46C0, 0xA370, 0xD1BC, 0x4660, 0xA338, 0xD19E, 0x4630, 0xA31C, 0x4618, 0x460C, 0x4770, 0xA3BC,
        0x4738, 0xA39E, 0x471C, 0x47BC, 0xA160, 0xD0B8, 0xE85E, 0x4240, 0xA130, 0xD09C, 0x4220, 0xA118,
        0xD08E, 0x4210, 0xA10C, 0x4208, 0xA106, 0x4360, 0xA1B8, 0xD0DE, 0x4330, 0xA19C, 0x4318, 0xA18E,
        0x430C, 0x4306, 0xA1DE, 0x438E, 0x4140, 0xA0B0, 0xD05C, 0x4120, 0xA098, 0xD04E, 0x4110, 0xA08C,
        0x4108, 0xA086, 0x4104, 0x41B0, 0x4198, 0x418C, 0x40A0, 0xD02E, 0xA04C, 0xA046, 0x4082, 0xCAE0,
        0xE578, 0xF2BE, 0x94C0, 0xCA70, 0xE53C, 0x9460, 0xCA38, 0xE51E, 0x2840, 0x9430, 0x2820, 0x96E0,
        0xCB78, 0xE5BE, 0x2CC0, 0x9670, 0xCB3C, 0x2C60, 0x9638, 0x2C30, 0x2C18, 0x2EE0, 0x9778, 0xCBBE,
        0x2E70, 0x973C, 0x2E38, 0x2E1C, 0x2F78, 0x97BE, 0x2F3C, 0x2FBE, 0xDAC0, 0xED70, 0xF6BC, 0xDA60,
        0xED38, 0xF69E, 0xB440, 0xDA30, 0xED1C, 0xB420, 0xDA18, 0xED0E, 0xB410, 0xDA0C, 0x92C0, 0xC970,
        0xE4BC, 0xB6C0, 0x9260, 0xC938, 0xE49E, 0xB660, 0xDB38, 0xED9E, 0x6C40, 0x2420, 0x9218, 0xC90E,
        0x6C20, 0xB618, 0x6C10, 0x26C0, 0x9370, 0xC9BC, 0x6EC0, 0x2660, 0x9338, 0xC99E, 0x6E60, 0xB738,
        0xDB9E, 0x6E30, 0x2618, 0x6E18, 0x2770, 0x93BC, 0x6F70, 0x2738, 0x939E, 0x6F38, 0xB79E, 0x6F1C,
        0x27BC, 0x6FBC, 0x279E, 0x6F9E, 0xD960, 0xECB8, 0xF65E, 0xB240, 0xD930, 0xEC9C, 0xB220, 0xD918,
        0xEC8E, 0xB210, 0xD90C, 0xB208, 0xB204, 0x9160, 0xC8B8, 0xE45E, 0xB360, 0x9130, 0xC89C, 0x6640,
        0x2220, 0xD99C, 0xC88E, 0x6620, 0x2210, 0x910C, 0x6610, 0xB30C, 0x9106, 0x2204, 0x2360, 0x91B8,
        0xC8DE, 0x6760, 0x2330, 0x919C, 0x6730, 0xB39C, 0x918E, 0x6718, 0x230C, 0x2306, 0x23B8, 0x91DE,
        0x67B8, 0x239C, 0x679C, 0x238E, 0x678E, 0x67DE, 0xB140, 0xD8B0, 0xEC5C, 0xB120, 0xD898, 0xEC4E,
        0xB110, 0xD88C, 0xB108, 0xD886, 0xB104, 0xB102, 0x2140, 0x90B0, 0xC85C, 0x6340, 0x2120, 0x9098,
        0xC84E, 0x6320, 0xB198, 0xD8CE, 0x6310, 0x2108, 0x9086, 0x6308, 0xB186, 0x6304, 0x21B0, 0x90DC,
        0x63B0, 0x2198, 0x90CE, 0x6398, 0xB1CE, 0x638C, 0x2186, 0x6386, 0x63DC, 0x63CE, 0xB0A0, 0xD858,
        0xEC2E, 0xB090, 0xD84C, 0xB088, 0xD846, 0xB084, 0xB082, 0x20A0, 0x9058, 0xC82E, 0x61A0, 0x2090,
        0x904C, 0x6190, 0xB0CC, 0x9046, 0x6188, 0x2084, 0x6184, 0x2082, 0x20D8, 0x61D8, 0x61CC, 0x61C6,
        0xD82C, 0xD826, 0xB042, 0x902C, 0x2048, 0x60C8, 0x60C4, 0x60C2, 0x8AC0, 0xC570, 0xE2BC, 0x8A60,
        0xC538, 0x1440, 0x8A30, 0xC51C, 0x1420, 0x8A18, 0x1410, 0x1408, 0x16C0, 0x8B70, 0xC5BC, 0x1660,
        0x8B38, 0xC59E, 0x1630, 0x8B1C, 0x1618, 0x160C, 0x1770, 0x8BBC, 0x1738, 0x8B9E, 0x171C, 0x17BC,
        0x179E, 0xCD60, 0xE6B8, 0xF35E, 0x9A40, 0xCD30, 0xE69C, 0x9A20, 0xCD18, 0xE68E, 0x9A10, 0xCD0C,
        0x9A08, 0xCD06, 0x8960, 0xC4B8, 0xE25E, 0x9B60, 0x8930, 0xC49C, 0x3640, 0x1220, 0xCD9C, 0xC48E,
        0x3620, 0x9B18, 0x890C, 0x3610, 0x1208, 0x3608, 0x1360, 0x89B8, 0xC4DE, 0x3760, 0x1330, 0xCDDE,
        0x3730, 0x9B9C, 0x898E, 0x3718, 0x130C, 0x370C, 0x13B8, 0x89DE, 0x37B8, 0x139C, 0x379C, 0x138E,
        0x13DE, 0x37DE, 0xDD40, 0xEEB0, 0xF75C, 0xDD20, 0xEE98, 0xF74E, 0xDD10, 0xEE8C, 0xDD08, 0xEE86,
        0xDD04, 0x9940, 0xCCB0, 0xE65C, 0xBB40, 0x9920, 0xEEDC, 0xE64E, 0xBB20, 0xDD98, 0xEECE, 0xBB10,
        0x9908, 0xCC86, 0xBB08, 0xDD86, 0x9902, 0x1140, 0x88B0, 0xC45C, 0x3340, 0x1120, 0x8898, 0xC44E,
        0x7740, 0x3320, 0x9998, 0xCCCE, 0x7720, 0xBB98, 0xDDCE, 0x8886, 0x7710, 0x3308, 0x9986, 0x7708,
        0x1102, 0x11B0, 0x88DC, 0x33B0, 0x1198, 0x88CE, 0x77B0, 0x3398, 0x99CE, 0x7798, 0xBBCE, 0x1186,
        0x3386, 0x11DC, 0x33DC, 0x11CE, 0x77DC, 0x33CE, 0xDCA0, 0xEE58, 0xF72E, 0xDC90, 0xEE4C, 0xDC88,
        0xEE46, 0xDC84, 0xDC82, 0x98A0, 0xCC58, 0xE62E, 0xB9A0, 0x9890, 0xEE6E, 0xB990, 0xDCCC, 0xCC46,
        0xB988, 0x9884, 0xB984, 0x9882, 0xB982, 0x10A0, 0x8858, 0xC42E, 0x31A0, 0x1090, 0x884C, 0x73A0,
        0x3190, 0x98CC, 0x8846, 0x7390, 0xB9CC, 0x1084, 0x7388, 0x3184, 0x1082, 0x3182, 0x10D8, 0x886E,
        0x31D8, 0x10CC, 0x73D8, 0x31CC, 0x10C6, 0x73CC, 0x31C6, 0x10EE, 0x73EE, 0xDC50, 0xEE2C, 0xDC48,
        0xEE26, 0xDC44, 0xDC42, 0x9850, 0xCC2C, 0xB8D0, 0x9848, 0xCC26, 0xB8C8, 0xDC66, 0xB8C4, 0x9842,
        0xB8C2, 0x1050, 0x882C, 0x30D0, 0x1048, 0x8826, 0x71D0, 0x30C8, 0x9866, 0x71C8, 0xB8E6, 0x1042,
        0x71C4, 0x30C2, 0x71C2, 0x30EC, 0x71EC, 0x71E6, 0xEE16, 0xDC22, 0xCC16, 0x9824, 0x9822, 0x1028,
        0x3068, 0x70E8, 0x1022, 0x3062, 0x8560, 0x0A40, 0x8530, 0x0A20, 0x8518, 0xC28E, 0x0A10, 0x850C,
        0x0A08, 0x8506, 0x0B60, 0x85B8, 0xC2DE, 0x0B30, 0x859C, 0x0B18, 0x858E, 0x0B0C, 0x0B06, 0x0BB8,
        0x85DE, 0x0B9C, 0x0B8E, 0x0BDE, 0x8D40, 0xC6B0, 0xE35C, 0x8D20, 0xC698, 0x8D10, 0xC68C, 0x8D08,
        0xC686, 0x8D04, 0x0940, 0x84B0, 0xC25C, 0x1B40, 0x0920, 0xC6DC, 0xC24E, 0x1B20, 0x8D98, 0xC6CE,
        0x1B10, 0x0908, 0x8486, 0x1B08, 0x8D86, 0x0902, 0x09B0, 0x84DC, 0x1BB0, 0x0998, 0x84CE, 0x1B98,
        0x8DCE, 0x1B8C, 0x0986, 0x09DC, 0x1BDC, 0x09CE, 0x1BCE, 0xCEA0, 0xE758, 0xF3AE, 0xCE90, 0xE74C,
        0xCE88, 0xE746, 0xCE84, 0xCE82, 0x8CA0, 0xC658, 0x9DA0, 0x8C90, 0xC64C, 0x9D90, 0xCECC, 0xC646,
        0x9D88, 0x8C84, 0x9D84, 0x8C82, 0x9D82, 0x08A0, 0x8458, 0x19A0, 0x0890, 0xC66E, 0x3BA0, 0x1990,
        0x8CCC, 0x8446, 0x3B90, 0x9DCC, 0x0884, 0x3B88, 0x1984, 0x0882, 0x1982, 0x08D8, 0x846E, 0x19D8,
        0x08CC, 0x3BD8, 0x19CC, 0x08C6, 0x3BCC, 0x19C6, 0x08EE, 0x19EE, 0x3BEE, 0xEF50, 0xF7AC, 0xEF48,
        0xF7A6, 0xEF44, 0xEF42, 0xCE50, 0xE72C, 0xDED0, 0xEF6C, 0xE726, 0xDEC8, 0xEF66, 0xDEC4, 0xCE42,
        0xDEC2, 0x8C50, 0xC62C, 0x9CD0, 0x8C48, 0xC626, 0xBDD0, 0x9CC8, 0xCE66, 0xBDC8, 0xDEE6, 0x8C42,
        0xBDC4, 0x9CC2, 0xBDC2, 0x0850, 0x842C, 0x18D0, 0x0848, 0x8426, 0x39D0, 0x18C8, 0x8C66, 0x7BD0,
        0x39C8, 0x9CE6, 0x0842, 0x7BC8, 0xBDE6, 0x18C2, 0x7BC4, 0x086C, 0x18EC, 0x0866, 0x39EC, 0x18E6,
        0x7BEC, 0x39E6, 0x7BE6, 0xEF28, 0xF796, 0xEF24, 0xEF22, 0xCE28, 0xE716, 0xDE68, 0xEF36, 0xDE64,
        0xCE22, 0xDE62, 0x8C28, 0xC616, 0x9C68, 0x8C24, 0xBCE8, 0x9C64, 0x8C22, 0xBCE4, 0x9C62, 0xBCE2,
        0x0828, 0x8416, 0x1868, 0x8C36, 0x38E8, 0x1864, 0x0822, 0x79E8, 0x38E4, 0x1862, 0x79E4, 0x38E2,
        0x79E2, 0x1876, 0x79F6, 0xEF12, 0xDE34, 0xDE32, 0x9C34, 0xBC74, 0xBC72, 0x1834, 0x3874, 0x78F4,
        0x78F2, 0x0540, 0x0520, 0x8298, 0x0510, 0x0508, 0x0504, 0x05B0, 0x0598, 0x058C, 0x0586, 0x05DC,
        0x05CE, 0x86A0, 0x8690, 0xC34C, 0x8688, 0xC346, 0x8684, 0x8682, 0x04A0, 0x8258, 0x0DA0, 0x86D8,
        0x824C, 0x0D90, 0x86CC, 0x0D88, 0x86C6, 0x0D84, 0x0482, 0x0D82, 0x04D8, 0x826E, 0x0DD8, 0x86EE,
        0x0DCC, 0x04C6, 0x0DC6, 0x04EE, 0x0DEE, 0xC750, 0xC748, 0xC744, 0xC742, 0x8650, 0x8ED0, 0xC76C,
        0xC326, 0x8EC8, 0xC766, 0x8EC4, 0x8642, 0x8EC2, 0x0450, 0x0CD0, 0x0448, 0x8226, 0x1DD0, 0x0CC8,
        0x0444, 0x1DC8, 0x0CC4, 0x0442, 0x1DC4, 0x0CC2, 0x046C, 0x0CEC, 0x0466, 0x1DEC, 0x0CE6, 0x1DE6,
        0xE7A8, 0xE7A4, 0xE7A2, 0xC728, 0xCF68, 0xE7B6, 0xCF64, 0xC722, 0xCF62, 0x8628, 0xC316, 0x8E68,
        0xC736, 0x9EE8, 0x8E64, 0x8622, 0x9EE4, 0x8E62, 0x9EE2, 0x0428, 0x8216, 0x0C68, 0x8636, 0x1CE8,
        0x0C64, 0x0422, 0x3DE8, 0x1CE4, 0x0C62, 0x3DE4, 0x1CE2, 0x0436, 0x0C76, 0x1CF6, 0x3DF6, 0xF7D4,
        0xF7D2, 0xE794, 0xEFB4, 0xE792, 0xEFB2, 0xC714, 0xCF34, 0xC712, 0xDF74, 0xCF32, 0xDF72, 0x8614,
        0x8E34, 0x8612, 0x9E74, 0x8E32, 0xBEF4,
    ],
    [
        0xF560, 0xFAB8, 0xEA40, 0xF530, 0xFA9C, 0xEA20, 0xF518, 0xFA8E, 0xEA10, 0xF50C, 0xEA08, 0xF506,
        0xEA04, 0xEB60, 0xF5B8, 0xFADE, 0xD640, 0xEB30, 0xF59C, 0xD620, 0xEB18, 0xF58E, 0xD610, 0xEB0C,
        0xD608, 0xEB06, 0xD604, 0xD760, 0xEBB8, 0xF5DE, 0xAE40, 0xD730, 0xEB9C, 0xAE20, 0xD718, 0xEB8E,
        0xAE10, 0xD70C, 0xAE08, 0xD706, 0xAE04, 0xAF60, 0xD7B8, 0xEBDE, 0x5E40, 0xAF30, 0xD79C, 0x5E20,
        0xAF18, 0xD78E, 0x5E10, 0xAF0C, 0x5E08, 0xAF06, 0x5F60, 0xAFB8, 0xD7DE, 0x5F30, 0xAF9C, 0x5F18,
        0xAF8E, 0x5F0C, 0x5FB8, 0xAFDE, 0x5F9C, 0x5F8E, 0xE940, 0xF4B0, 0xFA5C, 0xE920, 0xF498, 0xFA4E,
        0xE910, 0xF48C, 0xE908, 0xF486, 0xE904, 0xE902, 0xD340, 0xE9B0, 0xF4DC, 0xD320, 0xE998, 0xF4CE,
        0xD310, 0xE98C, 0xD308, 0xE986, 0xD304, 0xD302, 0xA740, 0xD3B0, 0xE9DC, 0xA720, 0xD398, 0xE9CE,
        0xA710, 0xD38C, 0xA708, 0xD386, 0xA704, 0xA702, 0x4F40, 0xA7B0, 0xD3DC, 0x4F20, 0xA798, 0xD3CE,
        0x4F10, 0xA78C, 0x4F08, 0xA786, 0x4F04, 0x4FB0, 0xA7DC, 0x4F98, 0xA7CE, 0x4F8C, 0x4F86, 0x4FDC,
        0x4FCE, 0xE8A0, 0xF458, 0xFA2E, 0xE890, 0xF44C, 0xE888, 0xF446, 0xE884, 0xE882, 0xD1A0, 0xE8D8,
        0xF46E, 0xD190, 0xE8CC, 0xD188, 0xE8C6, 0xD184, 0xD182, 0xA3A0, 0xD1D8, 0xE8EE, 0xA390, 0xD1CC,
        0xA388, 0xD1C6, 0xA384, 0xA382, 0x47A0, 0xA3D8, 0xD1EE, 0x4790, 0xA3CC, 0x4788, 0xA3C6, 0x4784,
        0x4782, 0x47D8, 0xA3EE, 0x47CC, 0x47C6, 0x47EE, 0xE850, 0xF42C, 0xE848, 0xF426, 0xE844, 0xE842,
        0xD0D0, 0xE86C, 0xD0C8, 0xE866, 0xD0C4, 0xD0C2, 0xA1D0, 0xD0EC, 0xA1C8, 0xD0E6, 0xA1C4, 0xA1C2,
        0x43D0, 0xA1EC, 0x43C8, 0xA1E6, 0x43C4, 0x43C2, 0x43EC, 0x43E6, 0xE828, 0xF416, 0xE824, 0xE822,
        0xD068, 0xE836, 0xD064, 0xD062, 0xA0E8, 0xD076, 0xA0E4, 0xA0E2, 0x41E8, 0xA0F6, 0x41E4, 0x41E2,
        0xE814, 0xE812, 0xD034, 0xD032, 0xA074, 0xA072, 0xE540, 0xF2B0, 0xF95C, 0xE520, 0xF298, 0xF94E,
        0xE510, 0xF28C, 0xE508, 0xF286, 0xE504, 0xE502, 0xCB40, 0xE5B0, 0xF2DC, 0xCB20, 0xE598, 0xF2CE,
        0xCB10, 0xE58C, 0xCB08, 0xE586, 0xCB04, 0xCB02, 0x9740, 0xCBB0, 0xE5DC, 0x9720, 0xCB98, 0xE5CE,
        0x9710, 0xCB8C, 0x9708, 0xCB86, 0x9704, 0x9702, 0x2F40, 0x97B0, 0xCBDC, 0x2F20, 0x9798, 0xCBCE,
        0x2F10, 0x978C, 0x2F08, 0x9786, 0x2F04, 0x2FB0, 0x97DC, 0x2F98, 0x97CE, 0x2F8C, 0x2F86, 0x2FDC,
        0x2FCE, 0xF6A0, 0xFB58, 0x6BF0, 0xF690, 0xFB4C, 0x69F8, 0xF688, 0xFB46, 0x68FC, 0xF684, 0xF682,
        0xE4A0, 0xF258, 0xF92E, 0xEDA0, 0xE490, 0xFB6E, 0xED90, 0xF6CC, 0xF246, 0xED88, 0xE484, 0xED84,
        0xE482, 0xED82, 0xC9A0, 0xE4D8, 0xF26E, 0xDBA0, 0xC990, 0xE4CC, 0xDB90, 0xEDCC, 0xE4C6, 0xDB88,
        0xC984, 0xDB84, 0xC982, 0xDB82, 0x93A0, 0xC9D8, 0xE4EE, 0xB7A0, 0x9390, 0xC9CC, 0xB790, 0xDBCC,
        0xC9C6, 0xB788, 0x9384, 0xB784, 0x9382, 0xB782, 0x27A0, 0x93D8, 0xC9EE, 0x6FA0, 0x2790, 0x93CC,
        0x6F90, 0xB7CC, 0x93C6, 0x6F88, 0x2784, 0x6F84, 0x2782, 0x27D8, 0x93EE, 0x6FD8, 0x27CC, 0x6FCC,
        0x27C6, 0x6FC6, 0x27EE, 0xF650, 0xFB2C, 0x65F8, 0xF648, 0xFB26, 0x64FC, 0xF644, 0x647E, 0xF642,
        0xE450, 0xF22C, 0xECD0, 0xE448, 0xF226, 0xECC8, 0xF666, 0xECC4, 0xE442, 0xECC2, 0xC8D0, 0xE46C,
        0xD9D0, 0xC8C8, 0xE466, 0xD9C8, 0xECE6, 0xD9C4, 0xC8C2, 0xD9C2, 0x91D0, 0xC8EC, 0xB3D0, 0x91C8,
        0xC8E6, 0xB3C8, 0xD9E6, 0xB3C4, 0x91C2, 0xB3C2, 0x23D0, 0x91EC, 0x67D0, 0x23C8, 0x91E6, 0x67C8,
        0xB3E6, 0x67C4, 0x23C2, 0x67C2, 0x23EC, 0x67EC, 0x23E6, 0x67E6, 0xF628, 0xFB16, 0x62FC, 0xF624,
        0x627E, 0xF622, 0xE428, 0xF216, 0xEC68, 0xF636, 0xEC64, 0xE422, 0xEC62, 0xC868, 0xE436, 0xD8E8,
        0xC864, 0xD8E4, 0xC862, 0xD8E2, 0x90E8, 0xC876, 0xB1E8, 0xD8F6, 0xB1E4, 0x90E2, 0xB1E2, 0x21E8,
        0x90F6, 0x63E8, 0x21E4, 0x63E4, 0x21E2, 0x63E2, 0x21F6, 0x63F6, 0xF614, 0x617E, 0xF612, 0xE414,
        0xEC34, 0xE412, 0xEC32, 0xC834, 0xD874, 0xC832, 0xD872, 0x9074, 0xB0F4, 0x9072, 0xB0F2, 0x20F4,
        0x61F4, 0x20F2, 0x61F2, 0xF60A, 0xE40A, 0xEC1A, 0xC81A, 0xD83A, 0x903A, 0xB07A, 0xE2A0, 0xF158,
        0xF8AE, 0xE290, 0xF14C, 0xE288, 0xF146, 0xE284, 0xE282, 0xC5A0, 0xE2D8, 0xF16E, 0xC590, 0xE2CC,
        0xC588, 0xE2C6, 0xC584, 0xC582, 0x8BA0, 0xC5D8, 0xE2EE, 0x8B90, 0xC5CC, 0x8B88, 0xC5C6, 0x8B84,
        0x8B82, 0x17A0, 0x8BD8, 0xC5EE, 0x1790, 0x8BCC, 0x1788, 0x8BC6, 0x1784, 0x1782, 0x17D8, 0x8BEE,
        0x17CC, 0x17C6, 0x17EE, 0xF350, 0xF9AC, 0x35F8, 0xF348, 0xF9A6, 0x34FC, 0xF344, 0x347E, 0xF342,
        0xE250, 0xF12C, 0xE6D0, 0xE248, 0xF126, 0xE6C8, 0xF366, 0xE6C4, 0xE242, 0xE6C2, 0xC4D0, 0xE26C,
        0xCDD0, 0xC4C8, 0xE266, 0xCDC8, 0xE6E6, 0xCDC4, 0xC4C2, 0xCDC2, 0x89D0, 0xC4EC, 0x9BD0, 0x89C8,
        0xC4E6, 0x9BC8, 0xCDE6, 0x9BC4, 0x89C2, 0x9BC2, 0x13D0, 0x89EC, 0x37D0, 0x13C8, 0x89E6, 0x37C8,
        0x9BE6, 0x37C4, 0x13C2, 0x37C2, 0x13EC, 0x37EC, 0x13E6, 0x37E6, 0xFBA8, 0x75F0, 0xBAFC, 0xFBA4,
        0x74F8, 0xBA7E, 0xFBA2, 0x747C, 0x743E, 0xF328, 0xF996, 0x32FC, 0xF768, 0xFBB6, 0x76FC, 0x327E,
        0xF764, 0xF322, 0x767E, 0xF762, 0xE228, 0xF116, 0xE668, 0xE224, 0xEEE8, 0xF776, 0xE222, 0xEEE4,
        0xE662, 0xEEE2, 0xC468, 0xE236, 0xCCE8, 0xC464, 0xDDE8, 0xCCE4, 0xC462, 0xDDE4, 0xCCE2, 0xDDE2,
        0x88E8, 0xC476, 0x99E8, 0x88E4, 0xBBE8, 0x99E4, 0x88E2, 0xBBE4, 0x99E2, 0xBBE2, 0x11E8, 0x88F6,
        0x33E8, 0x11E4, 0x77E8, 0x33E4, 0x11E2, 0x77E4, 0x33E2, 0x77E2, 0x11F6, 0x33F6, 0xFB94, 0x72F8,
        0xB97E, 0xFB92, 0x727C, 0x723E, 0xF314, 0x317E, 0xF734, 0xF312, 0x737E, 0xF732, 0xE214, 0xE634,
        0xE212, 0xEE74, 0xE632, 0xEE72, 0xC434, 0xCC74, 0xC432, 0xDCF4, 0xCC72, 0xDCF2, 0x8874, 0x98F4,
        0x8872, 0xB9F4, 0x98F2, 0xB9F2, 0x10F4, 0x31F4, 0x10F2, 0x73F4, 0x31F2, 0x73F2, 0xFB8A, 0x717C,
        0x713E, 0xF30A, 0xF71A, 0xE20A, 0xE61A, 0xEE3A, 0xC41A, 0xCC3A, 0xDC7A, 0x883A, 0x987A, 0xB8FA,
        0x107A, 0x30FA, 0x71FA, 0x70BE, 0xE150, 0xF0AC, 0xE148, 0xF0A6, 0xE144, 0xE142, 0xC2D0, 0xE16C,
        0xC2C8, 0xE166, 0xC2C4, 0xC2C2, 0x85D0, 0xC2EC, 0x85C8, 0xC2E6, 0x85C4, 0x85C2, 0x0BD0, 0x85EC,
        0x0BC8, 0x85E6, 0x0BC4, 0x0BC2, 0x0BEC, 0x0BE6, 0xF1A8, 0xF8D6, 0x1AFC, 0xF1A4, 0x1A7E, 0xF1A2,
        0xE128, 0xF096, 0xE368, 0xE124, 0xE364, 0xE122, 0xE362, 0xC268, 0xE136, 0xC6E8, 0xC264, 0xC6E4,
        0xC262, 0xC6E2, 0x84E8, 0xC276, 0x8DE8, 0x84E4, 0x8DE4, 0x84E2, 0x8DE2, 0x09E8, 0x84F6, 0x1BE8,
        0x09E4, 0x1BE4, 0x09E2, 0x1BE2, 0x09F6, 0x1BF6, 0xF9D4, 0x3AF8, 0x9D7E, 0xF9D2, 0x3A7C, 0x3A3E,
        0xF194, 0x197E, 0xF3B4, 0xF192, 0x3B7E, 0xF3B2, 0xE114, 0xE334, 0xE112, 0xE774, 0xE332, 0xE772,
        0xC234, 0xC674, 0xC232, 0xCEF4, 0xC672, 0xCEF2, 0x8474, 0x8CF4, 0x8472, 0x9DF4, 0x8CF2, 0x9DF2,
        0x08F4, 0x19F4, 0x08F2, 0x3BF4, 0x19F2, 0x3BF2, 0x7AF0, 0xBD7C, 0x7A78, 0xBD3E, 0x7A3C, 0x7A1E,
        0xF9CA, 0x397C, 0xFBDA, 0x7B7C, 0x393E, 0x7B3E, 0xF18A, 0xF39A, 0xF7BA, 0xE10A, 0xE31A, 0xE73A,
        0xEF7A, 0xC21A, 0xC63A, 0xCE7A, 0xDEFA, 0x843A, 0x8C7A, 0x9CFA, 0xBDFA, 0x087A, 0x18FA, 0x39FA,
        0x7978, 0xBCBE, 0x793C, 0x791E, 0x38BE, 0x79BE, 0x78BC, 0x789E, 0x785E, 0xE0A8, 0xE0A4, 0xE0A2,
        0xC168, 0xE0B6, 0xC164, 0xC162, 0x82E8, 0xC176, 0x82E4, 0x82E2, 0x05E8, 0x82F6, 0x05E4, 0x05E2,
        0x05F6, 0xF0D4, 0x0D7E, 0xF0D2, 0xE094, 0xE1B4, 0xE092, 0xE1B2, 0xC134, 0xC374, 0xC132, 0xC372,
        0x8274, 0x86F4, 0x8272, 0x86F2, 0x04F4, 0x0DF4, 0x04F2, 0x0DF2, 0xF8EA, 0x1D7C, 0x1D3E, 0xF0CA,
        0xF1DA, 0xE08A, 0xE19A, 0xE3BA, 0xC11A, 0xC33A, 0xC77A, 0x823A, 0x867A, 0x8EFA, 0x047A, 0x0CFA,
        0x1DFA, 0x3D78, 0x9EBE, 0x3D3C, 0x3D1E, 0x1CBE, 0x3DBE, 0x7D70, 0xBEBC, 0x7D38, 0xBE9E, 0x7D1C,
        0x7D0E, 0x3CBC, 0x7DBC, 0x3C9E, 0x7D9E, 0x7CB8, 0xBE5E, 0x7C9C, 0x7C8E, 0x3C5E, 0x7CDE, 0x7C5C,
        0x7C4E, 0x7C2E, 0xC0B4, 0xC0B2, 0x8174, 0x8172, 0x02F4, 0x02F2, 0xE0DA, 0xC09A, 0xC1BA, 0x813A,
        0x837A, 0x027A, 0x06FA, 0x0EBE, 0x1EBC, 0x1E9E, 0x3EB8, 0x9F5E, 0x3E9C, 0x3E8E, 0x1E5E, 0x3EDE,
        0x7EB0, 0xBF5C, 0x7E98, 0xBF4E, 0x7E8C, 0x7E86, 0x3E5C, 0x7EDC, 0x3E4E, 0x7ECE, 0x7E58, 0xBF2E,
        0x7E4C, 0x7E46, 0x3E2E, 0x7E6E, 0x7E2C, 0x7E26, 0x0F5E, 0x1F5C, 0x1F4E, 0x3F58, 0x9FAE, 0x3F4C,
        0x3F46, 0x1F2E, 0x3F6E, 0x3F2C, 0x3F26,
    ],
    [
        0xABE0, 0xD5F8, 0x53C0, 0xA9F0, 0xD4FC, 0x51E0, 0xA8F8, 0xD47E, 0x50F0, 0xA87C, 0x5078, 0xFAD0,
        0x5BE0, 0xADF8, 0xFAC8, 0x59F0, 0xACFC, 0xFAC4, 0x58F8, 0xAC7E, 0xFAC2, 0x587C, 0xF5D0, 0xFAEC,
        0x5DF8, 0xF5C8, 0xFAE6, 0x5CFC, 0xF5C4, 0x5C7E, 0xF5C2, 0xEBD0, 0xF5EC, 0xEBC8, 0xF5E6, 0xEBC4,
        0xEBC2, 0xD7D0, 0xEBEC, 0xD7C8, 0xEBE6, 0xD7C4, 0xD7C2, 0xAFD0, 0xD7EC, 0xAFC8, 0xD7E6, 0xAFC4,
        0x4BC0, 0xA5F0, 0xD2FC, 0x49E0, 0xA4F8, 0xD27E, 0x48F0, 0xA47C, 0x4878, 0xA43E, 0x483C, 0xFA68,
        0x4DF0, 0xA6FC, 0xFA64, 0x4CF8, 0xA67E, 0xFA62, 0x4C7C, 0x4C3E, 0xF4E8, 0xFA76, 0x4EFC, 0xF4E4,
        0x4E7E, 0xF4E2, 0xE9E8, 0xF4F6, 0xE9E4, 0xE9E2, 0xD3E8, 0xE9F6, 0xD3E4, 0xD3E2, 0xA7E8, 0xD3F6,
        0xA7E4, 0xA7E2, 0x45E0, 0xA2F8, 0xD17E, 0x44F0, 0xA27C, 0x4478, 0xA23E, 0x443C, 0x441E, 0xFA34,
        0x46F8, 0xA37E, 0xFA32, 0x467C, 0x463E, 0xF474, 0x477E, 0xF472, 0xE8F4, 0xE8F2, 0xD1F4, 0xD1F2,
        0xA3F4, 0xA3F2, 0x42F0, 0xA17C, 0x4278, 0xA13E, 0x423C, 0x421E, 0xFA1A, 0x437C, 0x433E, 0xF43A,
        0xE87A, 0xD0FA, 0x4178, 0xA0BE, 0x413C, 0x411E, 0x41BE, 0x40BC, 0x409E, 0x2BC0, 0x95F0, 0xCAFC,
        0x29E0, 0x94F8, 0xCA7E, 0x28F0, 0x947C, 0x2878, 0x943E, 0x283C, 0xF968, 0x2DF0, 0x96FC, 0xF964,
        0x2CF8, 0x967E, 0xF962, 0x2C7C, 0x2C3E, 0xF2E8, 0xF976, 0x2EFC, 0xF2E4, 0x2E7E, 0xF2E2, 0xE5E8,
        0xF2F6, 0xE5E4, 0xE5E2, 0xCBE8, 0xE5F6, 0xCBE4, 0xCBE2, 0x97E8, 0xCBF6, 0x97E4, 0x97E2, 0xB5E0,
        0xDAF8, 0xED7E, 0x69C0, 0xB4F0, 0xDA7C, 0x68E0, 0xB478, 0xDA3E, 0x6870, 0xB43C, 0x6838, 0xB41E,
        0x681C, 0x25E0, 0x92F8, 0xC97E, 0x6DE0, 0x24F0, 0x927C, 0x6CF0, 0xB67C, 0x923E, 0x6C78, 0x243C,
        0x6C3C, 0x241E, 0x6C1E, 0xF934, 0x26F8, 0x937E, 0xFB74, 0xF932, 0x6EF8, 0x267C, 0xFB72, 0x6E7C,
        0x263E, 0x6E3E, 0xF274, 0x277E, 0xF6F4, 0xF272, 0x6F7E, 0xF6F2, 0xE4F4, 0xEDF4, 0xE4F2, 0xEDF2,
        0xC9F4, 0xDBF4, 0xC9F2, 0xDBF2, 0x93F4, 0x93F2, 0x65C0, 0xB2F0, 0xD97C, 0x64E0, 0xB278, 0xD93E,
        0x6470, 0xB23C, 0x6438, 0xB21E, 0x641C, 0x640E, 0x22F0, 0x917C, 0x66F0, 0x2278, 0x913E, 0x6678,
        0xB33E, 0x663C, 0x221E, 0x661E, 0xF91A, 0x237C, 0xFB3A, 0x677C, 0x233E, 0x673E, 0xF23A, 0xF67A,
        0xE47A, 0xECFA, 0xC8FA, 0xD9FA, 0x91FA, 0x62E0, 0xB178, 0xD8BE, 0x6270, 0xB13C, 0x6238, 0xB11E,
        0x621C, 0x620E, 0x2178, 0x90BE, 0x6378, 0x213C, 0x633C, 0x211E, 0x631E, 0x21BE, 0x63BE, 0x6170,
        0xB0BC, 0x6138, 0xB09E, 0x611C, 0x610E, 0x20BC, 0x61BC, 0x209E, 0x619E, 0x60B8, 0xB05E, 0x609C,
        0x608E, 0x205E, 0x60DE, 0x605C, 0x604E, 0x15E0, 0x8AF8, 0xC57E, 0x14F0, 0x8A7C, 0x1478, 0x8A3E,
        0x143C, 0x141E, 0xF8B4, 0x16F8, 0x8B7E, 0xF8B2, 0x167C, 0x163E, 0xF174, 0x177E, 0xF172, 0xE2F4,
        0xE2F2, 0xC5F4, 0xC5F2, 0x8BF4, 0x8BF2, 0x35C0, 0x9AF0, 0xCD7C, 0x34E0, 0x9A78, 0xCD3E, 0x3470,
        0x9A3C, 0x3438, 0x9A1E, 0x341C, 0x340E, 0x12F0, 0x897C, 0x36F0, 0x1278, 0x893E, 0x3678, 0x9B3E,
        0x363C, 0x121E, 0x361E, 0xF89A, 0x137C, 0xF9BA, 0x377C, 0x133E, 0x373E, 0xF13A, 0xF37A, 0xE27A,
        0xE6FA, 0xC4FA, 0xCDFA, 0x89FA, 0xBAE0, 0xDD78, 0xEEBE, 0x74C0, 0xBA70, 0xDD3C, 0x7460, 0xBA38,
        0xDD1E, 0x7430, 0xBA1C, 0x7418, 0xBA0E, 0x740C, 0x32E0, 0x9978, 0xCCBE, 0x76E0, 0x3270, 0x993C,
        0x7670, 0xBB3C, 0x991E, 0x7638, 0x321C, 0x761C, 0x320E, 0x760E, 0x1178, 0x88BE, 0x3378, 0x113C,
        0x7778, 0x333C, 0x111E, 0x773C, 0x331E, 0x771E, 0x11BE, 0x33BE, 0x77BE, 0x72C0, 0xB970, 0xDCBC,
        0x7260, 0xB938, 0xDC9E, 0x7230, 0xB91C, 0x7218, 0xB90E, 0x720C, 0x7206, 0x3170, 0x98BC, 0x7370,
        0x3138, 0x989E, 0x7338, 0xB99E, 0x731C, 0x310E, 0x730E, 0x10BC, 0x31BC, 0x109E, 0x73BC, 0x319E,
        0x739E, 0x7160, 0xB8B8, 0xDC5E, 0x7130, 0xB89C, 0x7118, 0xB88E, 0x710C, 0x7106, 0x30B8, 0x985E,
        0x71B8, 0x309C, 0x719C, 0x308E, 0x718E, 0x105E, 0x30DE, 0x71DE, 0x70B0, 0xB85C, 0x7098, 0xB84E,
        0x708C, 0x7086, 0x305C, 0x70DC, 0x304E, 0x70CE, 0x7058, 0xB82E, 0x704C, 0x7046, 0x302E, 0x706E,
        0x702C, 0x7026, 0x0AF0, 0x857C, 0x0A78, 0x853E, 0x0A3C, 0x0A1E, 0x0B7C, 0x0B3E, 0xF0BA, 0xE17A,
        0xC2FA, 0x85FA, 0x1AE0, 0x8D78, 0xC6BE, 0x1A70, 0x8D3C, 0x1A38, 0x8D1E, 0x1A1C, 0x1A0E, 0x0978,
        0x84BE, 0x1B78, 0x093C, 0x1B3C, 0x091E, 0x1B1E, 0x09BE, 0x1BBE, 0x3AC0, 0x9D70, 0xCEBC, 0x3A60,
        0x9D38, 0xCE9E, 0x3A30, 0x9D1C, 0x3A18, 0x9D0E, 0x3A0C, 0x3A06, 0x1970, 0x8CBC, 0x3B70, 0x1938,
        0x8C9E, 0x3B38, 0x191C, 0x3B1C, 0x190E, 0x3B0E, 0x08BC, 0x19BC, 0x089E, 0x3BBC, 0x199E, 0x3B9E,
        0xBD60, 0xDEB8, 0xEF5E, 0x7A40, 0xBD30, 0xDE9C, 0x7A20, 0xBD18, 0xDE8E, 0x7A10, 0xBD0C, 0x7A08,
        0xBD06, 0x7A04, 0x3960, 0x9CB8, 0xCE5E, 0x7B60, 0x3930, 0x9C9C, 0x7B30, 0xBD9C, 0x9C8E, 0x7B18,
        0x390C, 0x7B0C, 0x3906, 0x7B06, 0x18B8, 0x8C5E, 0x39B8, 0x189C, 0x7BB8, 0x399C, 0x188E, 0x7B9C,
        0x398E, 0x7B8E, 0x085E, 0x18DE, 0x39DE, 0x7BDE, 0x7940, 0xBCB0, 0xDE5C, 0x7920, 0xBC98, 0xDE4E,
        0x7910, 0xBC8C, 0x7908, 0xBC86, 0x7904, 0x7902, 0x38B0, 0x9C5C, 0x79B0, 0x3898, 0x9C4E, 0x7998,
        0xBCCE, 0x798C, 0x3886, 0x7986, 0x185C, 0x38DC, 0x184E, 0x79DC, 0x38CE, 0x79CE, 0x78A0, 0xBC58,
        0xDE2E, 0x7890, 0xBC4C, 0x7888, 0xBC46, 0x7884, 0x7882, 0x3858, 0x9C2E, 0x78D8, 0x384C, 0x78CC,
        0x3846, 0x78C6, 0x182E, 0x386E, 0x78EE, 0x7850, 0xBC2C, 0x7848, 0xBC26, 0x7844, 0x7842, 0x382C,
        0x786C, 0x3826, 0x7866, 0x7828, 0xBC16, 0x7824, 0x7822, 0x3816, 0x7836, 0x0578, 0x82BE, 0x053C,
        0x051E, 0x05BE, 0x0D70, 0x86BC, 0x0D38, 0x869E, 0x0D1C, 0x0D0E, 0x04BC, 0x0DBC, 0x049E, 0x0D9E,
        0x1D60, 0x8EB8, 0xC75E, 0x1D30, 0x8E9C, 0x1D18, 0x8E8E, 0x1D0C, 0x1D06, 0x0CB8, 0x865E, 0x1DB8,
        0x0C9C, 0x1D9C, 0x0C8E, 0x1D8E, 0x045E, 0x0CDE, 0x1DDE, 0x3D40, 0x9EB0, 0xCF5C, 0x3D20, 0x9E98,
        0xCF4E, 0x3D10, 0x9E8C, 0x3D08, 0x9E86, 0x3D04, 0x3D02, 0x1CB0, 0x8E5C, 0x3DB0, 0x1C98, 0x8E4E,
        0x3D98, 0x9ECE, 0x3D8C, 0x1C86, 0x3D86, 0x0C5C, 0x1CDC, 0x0C4E, 0x3DDC, 0x1CCE, 0x3DCE, 0xBEA0,
        0xDF58, 0xEFAE, 0xBE90, 0xDF4C, 0xBE88, 0xDF46, 0xBE84, 0xBE82, 0x3CA0, 0x9E58, 0xCF2E, 0x7DA0,
        0x3C90, 0x9E4C, 0x7D90, 0xBECC, 0x9E46, 0x7D88, 0x3C84, 0x7D84, 0x3C82, 0x7D82, 0x1C58, 0x8E2E,
        0x3CD8, 0x1C4C, 0x7DD8, 0x3CCC, 0x1C46, 0x7DCC, 0x3CC6, 0x7DC6, 0x0C2E, 0x1C6E, 0x3CEE, 0x7DEE,
        0xBE50, 0xDF2C, 0xBE48, 0xDF26, 0xBE44, 0xBE42, 0x3C50, 0x9E2C, 0x7CD0, 0x3C48, 0x9E26, 0x7CC8,
        0xBE66, 0x7CC4, 0x3C42, 0x7CC2, 0x1C2C, 0x3C6C, 0x1C26, 0x7CEC, 0x3C66, 0x7CE6, 0xBE28, 0xDF16,
        0xBE24, 0xBE22, 0x3C28, 0x9E16, 0x7C68, 0x3C24, 0x7C64, 0x3C22, 0x7C62, 0x1C16, 0x3C36, 0x7C76,
        0xBE14, 0xBE12, 0x3C14, 0x7C34, 0x3C12, 0x7C32, 0x02BC, 0x029E, 0x06B8, 0x835E, 0x069C, 0x068E,
        0x025E, 0x06DE, 0x0EB0, 0x875C, 0x0E98, 0x874E, 0x0E8C, 0x0E86, 0x065C, 0x0EDC, 0x064E, 0x0ECE,
        0x1EA0, 0x8F58, 0xC7AE, 0x1E90, 0x8F4C, 0x1E88, 0x8F46, 0x1E84, 0x1E82, 0x0E58, 0x872E, 0x1ED8,
        0x8F6E, 0x1ECC, 0x0E46, 0x1EC6, 0x062E, 0x0E6E, 0x1EEE, 0x9F50, 0xCFAC, 0x9F48, 0xCFA6, 0x9F44,
        0x9F42, 0x1E50, 0x8F2C, 0x3ED0, 0x9F6C, 0x8F26, 0x3EC8, 0x1E44, 0x3EC4, 0x1E42, 0x3EC2, 0x0E2C,
        0x1E6C, 0x0E26, 0x3EEC, 0x1E66, 0x3EE6, 0xDFA8, 0xEFD6, 0xDFA4, 0xDFA2, 0x9F28, 0xCF96, 0xBF68,
        0x9F24, 0xBF64, 0x9F22, 0xBF62, 0x1E28, 0x8F16, 0x3E68, 0x1E24, 0x7EE8, 0x3E64, 0x1E22, 0x7EE4,
        0x3E62, 0x7EE2, 0x0E16, 0x1E36, 0x3E76, 0x7EF6, 0xDF94, 0xDF92, 0x9F14, 0xBF34, 0x9F12, 0xBF32,
        0x1E14, 0x3E34, 0x1E12, 0x7E74, 0x3E32, 0x7E72, 0xDF8A, 0x9F0A, 0xBF1A, 0x1E0A, 0x3E1A, 0x7E3A,
        0x035C, 0x034E, 0x0758, 0x83AE, 0x074C, 0x0746, 0x032E, 0x076E, 0x0F50, 0x87AC, 0x0F48, 0x87A6,
        0x0F44, 0x0F42, 0x072C, 0x0F6C, 0x0726, 0x0F66, 0x8FA8, 0xC7D6, 0x8FA4, 0x8FA2, 0x0F28, 0x8796,
        0x1F68, 0x8FB6, 0x1F64, 0x0F22, 0x1F62, 0x0716, 0x0F36, 0x1F76, 0xCFD4, 0xCFD2, 0x8F94, 0x9FB4,
        0x8F92, 0x9FB2, 0x0F14, 0x1F34, 0x0F12, 0x3F74, 0x1F32, 0x3F72, 0xCFCA, 0x8F8A, 0x9F9A, 0x0F0A,
        0x1F1A, 0x3F3A, 0x03AC, 0x03A6, 0x07A8, 0x83D6, 0x07A4, 0x07A2, 0x0396, 0x07B6, 0x87D4, 0x87D2,
        0x0794, 0x0FB4, 0x0792, 0x0FB2, 0xC7EA,
    ],
];
